//! Error types callers may want to match on.  Everything else is `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the command module bookkeeping in [`crate::commands::Holder`].
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Command module '{0}' is already loaded.")]
    AlreadyLoaded(String),

    #[error("Command module '{0}' isn't loaded.")]
    NotLoaded(String),

    #[error("Command '{command}' in module '{module}' is missing 'overview' property")]
    MissingOverview { command: String, module: String },

    #[error("Command in module '{0}' has an empty name")]
    MissingName(String),

    #[error("Could not read command module `{}`: {source}", path.to_string_lossy())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse command module `{}`: {source}", path.to_string_lossy())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Command '{command}' in module '{module}' failed to initialize: {source}")]
    Init {
        command: String,
        module: String,
        source: anyhow::Error,
    },
}

/// Why [`crate::Erisa::await_message`] gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AwaitError {
    #[error("Message await expired.")]
    Timeout,

    #[error("Message await was replaced by a newer one for the same channel and user.")]
    Superseded,
}
