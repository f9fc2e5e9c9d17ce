//! Common constants used across the application

/// Max documents per `batch_save` call. Mirrored into `limits.conf` on the server.
pub const MAX_DOCUMENTS_PER_BATCH_SAVE: usize = 1700;

/// How often to report upload progress, in seconds
pub const UPDATE_INTERVAL_SECS: u64 = 20;

/// Connection-establishment timeout for the management API, in seconds
pub const CONNECT_TIMEOUT_SECS: u64 = 3;

/// Config file read when no path is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "csv2kvstore.ini";

/// INI section holding every setting
pub const CONFIG_SECTION: &str = "SPLUNK";

/// Environment variable consulted before prompting for a password
pub const PASSWORD_ENV: &str = "CSV2KV_PASSWORD";

// limits.conf location of the batch size setting
pub const LIMITS_CONF: &str = "limits";
pub const KVSTORE_STANZA: &str = "kvstore";
pub const MAX_BATCH_SAVE_KEY: &str = "max_documents_per_batch_save";

/// Process exit code for fatal errors
pub const FATAL_EXIT_CODE: u8 = 2;
