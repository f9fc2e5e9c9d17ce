//! Remote KV store operations used by the pipeline

use std::collections::{BTreeMap, BTreeSet};

use crate::error::AppResult;
use crate::models::row::Row;

/// Operations the pipeline needs from the remote platform.
///
/// Implemented over HTTP by [`crate::services::session::Session`]; the
/// provisioner, limit enforcer and uploader only depend on this trait.
#[allow(async_fn_in_trait)]
pub trait KvService {
    /// Names of the KV store collections visible in the session's namespace.
    async fn list_collections(&self) -> AppResult<BTreeSet<String>>;

    async fn create_collection(&self, name: &str) -> AppResult<()>;

    async fn delete_collection(&self, name: &str) -> AppResult<()>;

    /// Inserts `rows` into `collection` in a single request.
    async fn batch_save(&self, collection: &str, rows: &[Row]) -> AppResult<()>;

    /// Stanza names of a `.conf` file, e.g. `limits`.
    async fn list_stanzas(&self, conf: &str) -> AppResult<BTreeSet<String>>;

    async fn create_stanza(&self, conf: &str, stanza: &str) -> AppResult<()>;

    /// Key/value content of one stanza.
    async fn stanza_content(&self, conf: &str, stanza: &str)
        -> AppResult<BTreeMap<String, String>>;

    async fn submit_stanza(&self, conf: &str, stanza: &str, key: &str, value: &str)
        -> AppResult<()>;

    /// Asks the web tier to re-read the app's configuration.
    async fn reload_app(&self) -> AppResult<()>;
}
