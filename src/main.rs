//! Batch upload of CSV rows into a Splunk KV store collection

mod app;
mod config;
mod constants;
mod error;
mod models;
mod services;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Settings;
use crate::constants::DEFAULT_CONFIG_FILE;

// High-performance memory allocator for non-MSVC targets
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);

    let settings = match Settings::load(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            init_logger(true);
            error!("{e}");
            return ExitCode::from(e.exit_code());
        }
    };

    init_logger(settings.debug_mode);
    info!("Starting csv2kvstore with {}", config_path.display());

    let credentials = config::default_source();
    app::run(&settings, credentials.as_ref()).await
}

/// Console output is on at `info` in debug mode and off otherwise;
/// `RUST_LOG` overrides both.
fn init_logger(debug_mode: bool) {
    let default_level = if debug_mode { "info" } else { "off" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}
