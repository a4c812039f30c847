use thiserror::Error;

/// Errors surfaced by the identicon pipeline.
///
/// Cloneable so a failed digest acquisition can be memoized and replayed to
/// every later caller of the same [`crate::Idicon`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdiconError {
    #[error("Failed to acquire digest: {0}")]
    Digest(String),

    #[error("Invalid color '{value}': {reason}")]
    InvalidColor { value: String, reason: String },

    #[error("Invalid render options: {0}")]
    Config(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Surface does not support {0}")]
    UnsupportedSurface(&'static str),
}

pub type Result<T> = std::result::Result<T, IdiconError>;
