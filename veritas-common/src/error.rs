//! Common error types for Veritas

use thiserror::Error;

/// Common result type for Veritas operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the engine and its binaries
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (client construction, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}
