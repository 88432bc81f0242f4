//! Common error types for srtmix

use thiserror::Error;

/// Common result type for srtmix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across the srtmix crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or parsing error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or parameter value
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
