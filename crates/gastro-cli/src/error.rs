//! Error types for gastro-cli

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for gastro-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gastro-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from a back-office operation
    #[error("Core error: {0}")]
    Core(#[from] gastro_core::Error),

    /// Error setting up authentication
    #[error("Auth error: {0}")]
    Auth(#[from] gastro_auth::AuthError),

    /// File system error
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server could not bind or stopped with an error
    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn io_with_path(source: std::io::Error, path: &Path) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
