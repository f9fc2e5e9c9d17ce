//! KV store collection provisioning

use std::collections::BTreeSet;

use crate::error::AppResult;
use crate::services::kvstore::KvService;
use crate::services::script_log::ScriptLog;

/// What [`ensure_collection`] did to the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provisioned {
    /// Already present, left untouched
    Verified,
    /// Created because it was absent (or rebuilt)
    Created,
}

/// Names of the collections visible in the session's namespace.
///
/// # Errors
///
/// Propagates the listing failure.
pub async fn list_collections<S: KvService>(store: &S) -> AppResult<BTreeSet<String>> {
    store.list_collections().await
}

/// Makes sure collection `name` exists, deleting it first when `rebuild` is set.
///
/// # Errors
///
/// Listing, delete and create failures are returned unchanged; the caller
/// treats them as fatal.
pub async fn ensure_collection<S: KvService>(
    store: &S,
    log: &ScriptLog,
    server: &str,
    name: &str,
    rebuild: bool,
) -> AppResult<Provisioned> {
    let mut existing = list_collections(store).await?;

    if rebuild {
        log.warning(format!(
            "deleting the kvstore {name} from {server} because DELETE_AND_REBUILD is set to True."
        ));
        if existing.remove(name) {
            store.delete_collection(name).await?;
        }
    }

    if existing.contains(name) {
        log.info(format!("verified collection {name} on server {server}."));
        return Ok(Provisioned::Verified);
    }

    log.warning(format!(
        "could not find collection {name} on server {server} - trying to create..."
    ));
    store.create_collection(name).await?;
    log.success(format!("created collection {name} on server {server}."));
    Ok(Provisioned::Created)
}
