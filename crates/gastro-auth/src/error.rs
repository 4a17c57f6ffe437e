//! Auth-specific error types.

/// Errors that can occur during authentication.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header or bearer token present.
    #[error("missing authentication token")]
    MissingToken,

    /// The identity provider does not recognise the token.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// User's email domain doesn't match the configured domain.
    #[error("invalid domain: got '{domain}', expected '{expected}'")]
    InvalidDomain {
        /// Domain of the user's email.
        domain: String,
        /// Configured domain.
        expected: String,
    },

    /// The provider returned a user without an email.
    #[error("user has no email")]
    MissingEmail,

    /// The identity provider could not be reached or answered garbage.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl AuthError {
    /// Whether this error should result in a 401 (vs. a 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::InvalidToken(_)
                | AuthError::Expired
                | AuthError::InvalidDomain { .. }
                | AuthError::MissingEmail
        )
    }
}
