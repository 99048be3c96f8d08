//! Error types for tsync-core

use std::path::PathBuf;

/// Result type for tsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a sync run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Diff(#[from] tsync_diff::Error),

    #[error(transparent)]
    Fs(#[from] tsync_fs::Error),

    #[error("failed to parse settings {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid ignore pattern `{pattern}`: {source}")]
    IgnorePattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}
