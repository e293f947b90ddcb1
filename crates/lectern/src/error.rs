//! Error types for the Lectern engine
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for the Lectern engine
#[derive(Error, Debug)]
pub enum LecternError {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type alias for the Lectern engine
pub type Result<T> = std::result::Result<T, LecternError>;
