//! Append-only script log
//!
//! Every entry is one line, `<timestamp>,script_action=<kind>,msg=<text>`.
//! The file is opened and closed on each call; entries are mirrored to
//! `tracing` so the console shows them when debug mode is on.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{error, info, warn};

use crate::models::action::ScriptAction;

/// Writer for the script log file.
#[derive(Debug, Clone)]
pub struct ScriptLog {
    path: PathBuf,
}

impl ScriptLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry. Write failures are reported through `tracing`
    /// and otherwise ignored.
    pub fn log(&self, action: ScriptAction, msg: impl AsRef<str>) {
        let msg = msg.as_ref();

        match action {
            ScriptAction::Info | ScriptAction::Success => info!(action = %action, "{msg}"),
            ScriptAction::Warning => warn!(action = %action, "{msg}"),
            ScriptAction::Failed | ScriptAction::Error => error!(action = %action, "{msg}"),
        }

        let line = format_entry(action, msg);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = result {
            warn!("Cannot write script log {}: {e}", self.path.display());
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.log(ScriptAction::Info, msg);
    }

    pub fn warning(&self, msg: impl AsRef<str>) {
        self.log(ScriptAction::Warning, msg);
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.log(ScriptAction::Success, msg);
    }

    pub fn failed(&self, msg: impl AsRef<str>) {
        self.log(ScriptAction::Failed, msg);
    }

    pub fn error(&self, msg: impl AsRef<str>) {
        self.log(ScriptAction::Error, msg);
    }
}

fn format_entry(action: ScriptAction, msg: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
    // keep one entry per line
    let msg = msg.replace(['\r', '\n'], " ");
    format!("{timestamp},script_action={action},msg={msg}\n")
}
