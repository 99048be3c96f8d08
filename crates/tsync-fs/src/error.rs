//! Error types for tsync-fs

use std::path::PathBuf;

/// Result type for tsync-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tsync-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", path.display())]
    NotUtf8 { path: PathBuf },
}
