//! Password acquisition.

use std::fmt;

use crate::config::env::get_env;
use crate::constants::PASSWORD_ENV;
use crate::error::{AppError, AppResult};

/// Password for the management API. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(****)")
    }
}

/// Source of the password used to open a session.
pub trait CredentialSource {
    /// Returns the password for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Credential` when no password can be obtained.
    fn obtain_credential(&self, user: &str) -> AppResult<Password>;
}

/// Reads the password from `CSV2KV_PASSWORD` (or `.env`).
#[derive(Debug, Default)]
pub struct EnvCredential;

impl CredentialSource for EnvCredential {
    fn obtain_credential(&self, _user: &str) -> AppResult<Password> {
        get_env(PASSWORD_ENV)
            .map(Password::new)
            .ok_or_else(|| AppError::Credential(format!("{PASSWORD_ENV} is not set")))
    }
}

/// Prompts on the terminal without echoing input.
#[derive(Debug, Default)]
pub struct PromptCredential;

impl CredentialSource for PromptCredential {
    fn obtain_credential(&self, user: &str) -> AppResult<Password> {
        rpassword::prompt_password(format!(
            "Please enter password for user {user} and press <Enter>: "
        ))
        .map(Password::new)
        .map_err(|e| AppError::Credential(e.to_string()))
    }
}

/// Picks the env source when the variable is set, the prompt otherwise.
#[must_use]
pub fn default_source() -> Box<dyn CredentialSource> {
    if get_env(PASSWORD_ENV).is_some() {
        Box::new(EnvCredential)
    } else {
        Box::new(PromptCredential)
    }
}
