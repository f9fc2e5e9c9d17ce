//! Configuration module.

pub mod credential;
mod env;
mod settings;

pub use credential::{default_source, CredentialSource, Password};
pub use settings::Settings;
