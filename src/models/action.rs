//! Script log action kinds

/// Kind of a script log entry, written as `script_action=<kind>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptAction {
    Info,
    Warning,
    Success,
    Failed,
    Error,
}

impl ScriptAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ScriptAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
