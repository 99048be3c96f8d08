//! Error types for tsync-diff

/// Result type for tsync-diff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tsync-diff operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("fuzzy-match pattern is {length} characters, limit is {max}")]
    PatternTooLong { length: usize, max: usize },
}
