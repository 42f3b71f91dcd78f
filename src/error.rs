//! Error types shared by the timer core and the allow-list loader

use thiserror::Error;

/// Errors returned by timer and presence operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The caller's address is not on the control allow-list.
    #[error("Access denied")]
    Unauthorized,

    /// A previous holder of the named component's lock panicked.
    #[error("Failed to lock {0} state")]
    LockPoisoned(&'static str),
}

/// Errors that can occur while loading the allow-list file.
#[derive(Debug, Error)]
pub enum AllowListError {
    #[error("Failed to read allow-list file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Allow-list file {path} is not a JSON array of strings: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
