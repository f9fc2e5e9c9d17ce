//! Upload pipeline: authenticate, provision, enforce limit, upload

use std::process::ExitCode;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{CredentialSource, Settings};
use crate::constants::{MAX_DOCUMENTS_PER_BATCH_SAVE, UPDATE_INTERVAL_SECS};
use crate::error::AppResult;
use crate::services::kvstore::KvService;
use crate::services::limits::enforce_batch_limit;
use crate::services::provisioner::ensure_collection;
use crate::services::script_log::ScriptLog;
use crate::services::session::Session;
use crate::services::uploader::{push_file, UploadOutcome, UploadTarget};

/// Runs the whole upload for `settings` and returns the process exit code.
pub async fn run(settings: &Settings, credentials: &dyn CredentialSource) -> ExitCode {
    let log = ScriptLog::new(&settings.log_file);

    let session = match open_session(settings, credentials).await {
        Ok(session) => session,
        Err(e) => {
            log.error(format!(
                "could not connect to splunk server {}. {e}",
                settings.server
            ));
            return ExitCode::from(e.exit_code());
        }
    };

    let target = UploadTarget {
        server: &settings.server,
        collection: &settings.collection_name,
        batch_size: MAX_DOCUMENTS_PER_BATCH_SAVE,
        progress_interval: Duration::from_secs(UPDATE_INTERVAL_SECS),
    };

    match upload(&session, settings, &log, &target).await {
        Ok(UploadOutcome::Completed { pushed, elapsed }) => {
            info!(pushed, elapsed_secs = elapsed.as_secs_f64(), "Upload completed");
            ExitCode::SUCCESS
        }
        Ok(UploadOutcome::Failed { pushed, error }) => {
            // record-level failures do not change the exit status
            warn!(pushed, "Upload stopped: {error}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log.error(format!(
                "could not provision collection {} on server {}. {e}",
                settings.collection_name, settings.server
            ));
            ExitCode::from(e.exit_code())
        }
    }
}

async fn open_session(settings: &Settings, credentials: &dyn CredentialSource) -> AppResult<Session> {
    let password = credentials.obtain_credential(&settings.user)?;
    Session::connect(settings, password).await
}

/// Provisions the collection, enforces the server batch limit and uploads
/// the input CSV.
///
/// # Errors
///
/// Only collection provisioning failures are returned; limit and upload
/// failures are logged and reflected in the outcome.
pub async fn upload<S: KvService>(
    store: &S,
    settings: &Settings,
    log: &ScriptLog,
    target: &UploadTarget<'_>,
) -> AppResult<UploadOutcome> {
    ensure_collection(
        store,
        log,
        &settings.server,
        &settings.collection_name,
        settings.delete_and_rebuild,
    )
    .await?;

    let report = enforce_batch_limit(store, log, &settings.server, target.batch_size).await;
    match &report.failed {
        Some(error) => warn!(
            stanza_created = report.stanza_created,
            value_submitted = report.value_submitted,
            reloads = report.reloads,
            "Batch limit not enforced: {error}"
        ),
        None => info!(
            stanza_created = report.stanza_created,
            value_submitted = report.value_submitted,
            reloads = report.reloads,
            "Batch limit enforced"
        ),
    }

    log.info(format!(
        "pushing {} to splunk",
        settings.input_csv.display()
    ));
    Ok(push_file(store, log, &settings.input_csv, target).await)
}
