//! Error types for the Gastro back-office.

/// Errors that can occur anywhere in the back-office.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Input failed validation before reaching the backend
    #[error("Validation error: {message}")]
    Validation {
        /// Field or aspect that failed validation
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// A tenant-scoped record does not exist (or is not visible)
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record ("reservation", "customer", ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The operation conflicts with the record's current state
    #[error("Conflict: {message}")]
    Conflict {
        /// What conflicted
        message: String,
    },

    /// A remote stored procedure rejected the call
    #[error("Procedure {name} failed: {message}")]
    Procedure {
        /// Procedure name, e.g. `rpc_canjear_premio`
        name: String,
        /// Message returned by the procedure
        message: String,
    },

    /// Hosted backend failure (transport, unexpected status, decoding)
    #[error("Backend error: {message}")]
    Backend {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// The caller has no access to the requested tenant
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Why access was refused
        message: String,
    },
}

/// Convenience `Result` type alias for Gastro operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error is retryable.
    ///
    /// Only transport-level backend failures are worth retrying; everything
    /// else is a permanent answer from validation or the database.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Backend { .. } => true,
            Error::Validation { .. } => false,
            Error::NotFound { .. } => false,
            Error::Conflict { .. } => false,
            Error::Procedure { .. } => false,
            Error::Serialization(_) => false,
            Error::Config { .. } => false,
            Error::Forbidden { .. } => false,
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a not-found error for the given entity kind.
    pub fn not_found<I: ToString>(entity: &'static str, id: I) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Error::Conflict {
            message: message.into(),
        }
    }

    /// Creates a stored-procedure error.
    pub fn procedure<N, M>(name: N, message: M) -> Self
    where
        N: Into<String>,
        M: Into<String>,
    {
        Error::Procedure {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a new backend error with a message.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Error::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new backend error with a message and source error.
    pub fn backend_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Error::Forbidden {
            message: message.into(),
        }
    }
}
