use thiserror::Error as ThisError;

/// Errors that can occur while encoding or writing log records
#[derive(ThisError, Debug)]
pub enum Error {
    /// The sink rejected the write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    /// A timestamp could not be formatted.
    #[error("Time format error: {0}")]
    Time(#[from] time::error::Format),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
