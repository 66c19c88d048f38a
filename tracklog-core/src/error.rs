//! Error types for tracklog-core
//!
//! Errors only leave the crate from constructors, configuration loading and
//! the [`Transport`](crate::transport::Transport) seam. The collector itself
//! absorbs every failure and reports it through `tracing`.

use thiserror::Error;

/// Main error type for the tracklog-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Network submission failed before a response arrived
    #[error("transport error: {0}")]
    Transport(String),

    /// The collector task has stopped and no longer accepts commands
    #[error("collector is not running")]
    Closed,
}

/// Result type alias for tracklog-core
pub type Result<T> = std::result::Result<T, Error>;
