//! Error types for LipTrack

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum LtError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Format version {0} is newer than supported")]
    FutureVersion(u16),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Too many {what}: {count} (max {max})")]
    LimitExceeded {
        what: &'static str,
        count: usize,
        max: usize,
    },
}

/// Result type alias
pub type LtResult<T> = Result<T, LtError>;
