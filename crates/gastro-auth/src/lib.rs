//! Bearer-token authentication for Gastro.
//!
//! Provides:
//! - [`AuthenticatedUser`]: identity extracted from a validated token
//! - [`TokenValidator`]: trait for async token validation (one per provider)
//! - [`HostedTokenValidator`]: validation against the hosted auth service
//! - [`StaticTokenValidator`]: fixed token table for local runs
//! - [`AuthLayer`] / [`AuthService`]: Tower middleware parameterised over `TokenValidator`
//! - [`AuthConfig`]: configuration for the auth layer
//! - [`AuthError`]: auth-specific error types

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod hosted;
mod middleware;
mod static_tokens;
mod user;

pub use error::AuthError;
pub use hosted::HostedTokenValidator;
pub use middleware::{AuthLayer, AuthService};
pub use static_tokens::StaticTokenValidator;
pub use user::{AuthenticatedUser, email_from_parts, user_from_parts};

use serde::{Deserialize, Serialize};

/// Configuration for the auth middleware.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether authentication is enabled. When false, all requests pass through.
    #[serde(default)]
    pub enabled: bool,
    /// Allowed email domain (e.g. "casapepe.es"). Empty string means any domain.
    #[serde(default)]
    pub domain: String,
}

/// Trait for validating tokens and extracting user identity.
///
/// The middleware calls `validate()` with the bearer token and stores the
/// returned user in the request extensions.
pub trait TokenValidator: Send + Sync + 'static {
    /// Validate a token and return the authenticated user.
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<AuthenticatedUser, AuthError>> + Send + '_>,
    >;
}

/// Rejects users whose email is outside the configured domain.
pub(crate) fn check_domain(email: &str, domain: &str) -> Result<(), AuthError> {
    if domain.is_empty() {
        return Ok(());
    }
    let user_domain = email.rsplit_once('@').map(|(_, d)| d).unwrap_or("");
    if !user_domain.eq_ignore_ascii_case(domain) {
        return Err(AuthError::InvalidDomain {
            domain: user_domain.to_string(),
            expected: domain.to_string(),
        });
    }
    Ok(())
}
