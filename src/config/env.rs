//! Environment variable lookups.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the environment by loading the .env file.
fn init_env() {
    INIT.call_once(|| {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(".env file not loaded: {e}");
        }
    });
}

/// Retrieves an environment variable by key, treating empty values as unset.
#[must_use]
pub fn get_env(key: &str) -> Option<String> {
    init_env();
    env::var(key).ok().filter(|v| !v.is_empty())
}
