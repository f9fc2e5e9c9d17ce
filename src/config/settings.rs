//! INI settings loaded once at startup.

use std::path::{Path, PathBuf};

use ini::{Ini, Properties};

use crate::constants::CONFIG_SECTION;
use crate::error::{AppError, AppResult};

/// Run configuration read from the `[SPLUNK]` section of the INI file.
///
/// Built once in `main` and handed by reference to every step of the
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    // Logging
    pub debug_mode: bool,
    pub log_file: PathBuf,

    // Input
    pub input_csv: PathBuf,

    // Management API
    pub server: String,
    pub server_port: u16,
    pub app: String,
    pub user: String,

    // Target collection
    pub collection_owner: String,
    pub collection_name: String,
    pub delete_and_rebuild: bool,

    // Optional transport settings
    pub scheme: String,
    pub web_port: u16,
    pub verify_tls: bool,
    pub locale: String,
}

impl Settings {
    /// Loads settings from an INI file on disk.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read, the section is
    /// missing, or any required key is missing or malformed.
    pub fn load(path: &Path) -> AppResult<Self> {
        let ini = Ini::load_from_file(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_ini(&ini)
    }

    /// Parses settings from INI text.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::load`].
    pub fn from_ini_str(text: &str) -> AppResult<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| AppError::Config(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> AppResult<Self> {
        let section = ini
            .section(Some(CONFIG_SECTION))
            .ok_or_else(|| AppError::Config(format!("missing section [{CONFIG_SECTION}]")))?;

        Ok(Self {
            debug_mode: required_bool(section, "DEBUG_MODE")?,
            log_file: PathBuf::from(required(section, "LOG_FILE")?),
            input_csv: PathBuf::from(required(section, "INPUT_CSV")?),
            server: required(section, "SPLUNK_SERVER")?.to_owned(),
            server_port: parse_port(required(section, "SPLUNK_SERVER_PORT")?, "SPLUNK_SERVER_PORT")?,
            app: required(section, "SPLUNK_APP")?.to_owned(),
            user: required(section, "SPLUNK_USER")?.to_owned(),
            collection_owner: required(section, "COLLECTION_OWNER")?.to_owned(),
            collection_name: required(section, "COLLECTION_NAME")?.to_owned(),
            delete_and_rebuild: required_bool(section, "DELETE_AND_REBUILD")?,

            scheme: optional(section, "SPLUNK_SCHEME").unwrap_or("https").to_owned(),
            web_port: optional(section, "SPLUNK_WEB_PORT")
                .map(|v| parse_port(v, "SPLUNK_WEB_PORT"))
                .transpose()?
                .unwrap_or(8000),
            verify_tls: optional(section, "VERIFY_TLS")
                .map(|v| parse_bool(v, "VERIFY_TLS"))
                .transpose()?
                .unwrap_or(false),
            locale: optional(section, "LOCALE").unwrap_or("en-US").to_owned(),
        })
    }

    /// Base URL of the management (REST) port, e.g. `https://host:8089`.
    #[must_use]
    pub fn management_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.server, self.server_port)
    }

    /// URL of the web UI `debug/refresh` endpoint for this app.
    #[must_use]
    pub fn reload_url(&self) -> String {
        format!(
            "{}://{}:{}/{}/debug/refresh?entity=apps/local/{}",
            self.scheme, self.server, self.web_port, self.locale, self.app
        )
    }
}

/// Looks a key up case-insensitively, like Python's `configparser`.
fn optional<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

fn required<'a>(section: &'a Properties, key: &str) -> AppResult<&'a str> {
    optional(section, key).ok_or_else(|| AppError::Config(format!("missing required key {key}")))
}

fn required_bool(section: &Properties, key: &str) -> AppResult<bool> {
    parse_bool(required(section, key)?, key)
}

fn parse_bool(value: &str, key: &str) -> AppResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(AppError::Config(format!(
            "{key} must be a boolean, got {value:?}"
        ))),
    }
}

fn parse_port(value: &str, key: &str) -> AppResult<u16> {
    value
        .parse()
        .map_err(|_| AppError::Config(format!("{key} must be a port number, got {value:?}")))
}
