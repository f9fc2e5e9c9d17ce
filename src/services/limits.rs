//! Server-side batch size limit (`limits.conf [kvstore]`)

use crate::constants::{KVSTORE_STANZA, LIMITS_CONF, MAX_BATCH_SAVE_KEY};
use crate::error::{AppError, AppResult};
use crate::services::kvstore::KvService;
use crate::services::script_log::ScriptLog;

/// Changes made while enforcing the limit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LimitReport {
    pub stanza_created: bool,
    pub value_submitted: bool,
    pub reloads: u32,
    /// Set when enforcement stopped on an error
    pub failed: Option<String>,
}

impl LimitReport {
    pub const fn is_failed(&self) -> bool {
        self.failed.is_some()
    }
}

/// Ensures `max_documents_per_batch_save` equals `batch_size` on the server.
///
/// Best effort: any failure is logged as `failed` and recorded in
/// [`LimitReport::failed`] instead of being returned. The other fields
/// describe what happened before the failure.
pub async fn enforce_batch_limit<S: KvService>(
    store: &S,
    log: &ScriptLog,
    server: &str,
    batch_size: usize,
) -> LimitReport {
    let mut report = LimitReport::default();
    let wanted = batch_size.to_string();

    if let Err(e) = apply_limit(store, log, server, &wanted, &mut report).await {
        log.failed(format!(
            "failed setting limits.conf {MAX_BATCH_SAVE_KEY} value to {wanted}. {e}"
        ));
        report.failed = Some(e.to_string());
    }
    report
}

async fn apply_limit<S: KvService>(
    store: &S,
    log: &ScriptLog,
    server: &str,
    wanted: &str,
    report: &mut LimitReport,
) -> AppResult<()> {
    let stanzas = store.list_stanzas(LIMITS_CONF).await?;
    if !stanzas.contains(KVSTORE_STANZA) {
        store.create_stanza(LIMITS_CONF, KVSTORE_STANZA).await?;
        report.stanza_created = true;
        reload(store, log, server, report).await;
        log.success(format!(
            "created {KVSTORE_STANZA} stanza in {LIMITS_CONF}.conf."
        ));
    }

    let content = store.stanza_content(LIMITS_CONF, KVSTORE_STANZA).await?;
    let reload_needed = match content.get(MAX_BATCH_SAVE_KEY) {
        Some(current) if current == wanted => false,
        Some(_) => {
            store
                .submit_stanza(LIMITS_CONF, KVSTORE_STANZA, MAX_BATCH_SAVE_KEY, wanted)
                .await?;
            report.value_submitted = true;
            log.success(format!("set {MAX_BATCH_SAVE_KEY} to {wanted}."));
            true
        }
        None => {
            // a newly added key is submitted without a reload
            store
                .submit_stanza(LIMITS_CONF, KVSTORE_STANZA, MAX_BATCH_SAVE_KEY, wanted)
                .await?;
            report.value_submitted = true;
            log.info(format!(
                "added {MAX_BATCH_SAVE_KEY} = {wanted} to {LIMITS_CONF}.conf without reload."
            ));
            false
        }
    };

    if reload_needed {
        reload(store, log, server, report).await;
    }

    log.info(format!(
        "verified {LIMITS_CONF}.conf {MAX_BATCH_SAVE_KEY} value is {wanted}."
    ));
    Ok(())
}

/// Issues one reload; the outcome is logged and never escalates.
async fn reload<S: KvService>(store: &S, log: &ScriptLog, server: &str, report: &mut LimitReport) {
    report.reloads += 1;
    match store.reload_app().await {
        Ok(()) => log.success(format!("reloaded {server}.")),
        Err(AppError::Api { .. }) => log.failed(format!(
            "failed reload of {server}, but no exceptions thrown."
        )),
        Err(e) => log.failed(format!("failed reload of {server}. {e}")),
    }
}
