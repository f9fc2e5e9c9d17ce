//! Batched CSV upload into a KV store collection

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::row::{CsvRows, Row};
use crate::services::kvstore::KvService;
use crate::services::script_log::ScriptLog;

/// Where and how to upload.
#[derive(Debug, Clone)]
pub struct UploadTarget<'a> {
    pub server: &'a str,
    pub collection: &'a str,
    pub batch_size: usize,
    pub progress_interval: Duration,
}

/// Terminal outcome of an upload. `pushed` counts rows confirmed by the server.
#[derive(Debug)]
pub enum UploadOutcome {
    Completed { pushed: usize, elapsed: Duration },
    Failed { pushed: usize, error: AppError },
}

/// Opens `path` and uploads its rows. Never returns an error: failures end
/// the upload and are reported through the log and the outcome.
pub async fn push_file<S: KvService>(
    store: &S,
    log: &ScriptLog,
    path: &Path,
    target: &UploadTarget<'_>,
) -> UploadOutcome {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return fail(log, target, 0, e.into()),
    };
    log.info(format!(
        "input csv file {} opened successfully.",
        path.display()
    ));
    push_rows(store, log, file, target).await
}

/// Uploads every row of `source` in batches of `target.batch_size`.
pub async fn push_rows<S: KvService, R: Read>(
    store: &S,
    log: &ScriptLog,
    source: R,
    target: &UploadTarget<'_>,
) -> UploadOutcome {
    let start = Instant::now();
    let mut pushed = 0;

    match stream_batches(store, log, source, target, start, &mut pushed).await {
        Ok(()) => {
            let elapsed = start.elapsed();
            log.success(format!(
                "pushed {pushed} records to kvstore {} on splunk server {} in {:.1} seconds.",
                target.collection,
                target.server,
                elapsed.as_secs_f64()
            ));
            UploadOutcome::Completed { pushed, elapsed }
        }
        Err(error) => fail(log, target, pushed, error),
    }
}

async fn stream_batches<S: KvService, R: Read>(
    store: &S,
    log: &ScriptLog,
    source: R,
    target: &UploadTarget<'_>,
    start: Instant,
    pushed: &mut usize,
) -> AppResult<()> {
    let batch_size = target.batch_size.max(1);
    let mut batch: Vec<Row> = Vec::with_capacity(batch_size);
    let mut last_progress = start;

    let rows = CsvRows::new(source)?;
    debug!("Columns: {}", rows.headers().collect::<Vec<_>>().join(","));

    for row in rows {
        batch.push(row?);
        if batch.len() < batch_size {
            continue;
        }

        store.batch_save(target.collection, &batch).await?;
        *pushed += batch.len();
        debug!("Saved batch of {} rows", batch.len());
        batch.clear();

        if progress_due(last_progress.elapsed(), target.progress_interval) {
            log.info(format!(
                "at {:.1} secs, {pushed} records pushed to kvstore {} on splunk server {}.",
                start.elapsed().as_secs_f64(),
                target.collection,
                target.server
            ));
            last_progress = Instant::now();
        }
    }

    if !batch.is_empty() {
        store.batch_save(target.collection, &batch).await?;
        *pushed += batch.len();
    }
    Ok(())
}

/// A progress entry is due once strictly more than `interval` has passed.
pub fn progress_due(since_last: Duration, interval: Duration) -> bool {
    since_last > interval
}

fn fail(log: &ScriptLog, target: &UploadTarget<'_>, pushed: usize, error: AppError) -> UploadOutcome {
    log.failed(format!(
        "could not push data to splunk server {}. Error occurred with {pushed} pushed. {error}",
        target.server
    ));
    UploadOutcome::Failed { pushed, error }
}
