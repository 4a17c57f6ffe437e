//! Token validation against the hosted auth service.
//!
//! The service owns sessions; a token is valid when `GET {url}/auth/v1/user`
//! answers with the user it belongs to.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use gastro_core::UserId;
use http::StatusCode;
use serde::Deserialize;

use crate::{AuthConfig, AuthError, AuthenticatedUser, TokenValidator, check_domain};

/// Path of the user endpoint under the project URL.
const USER_PATH: &str = "/auth/v1/user";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response of the user endpoint (only the fields used here).
#[derive(Debug, Deserialize)]
struct UserResponse {
    id: UserId,
    email: Option<String>,
}

/// Validates bearer tokens by asking the hosted auth service.
#[derive(Debug, Clone)]
pub struct HostedTokenValidator {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HostedTokenValidator {
    /// Create a validator for the project at `url`, authenticating with the
    /// public `api_key`.
    pub fn new(url: &str, api_key: &str) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AuthError::ProviderUnavailable(format!("http client: {e}")))?;
        Ok(Self {
            http_client,
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn validate_token(&self, token: &str, domain: &str) -> Result<AuthenticatedUser, AuthError> {
        let response = self
            .http_client
            .get(format!("{}{USER_PATH}", self.url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(format!("user request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidToken(format!(
                "auth service rejected token (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(AuthError::ProviderUnavailable(format!(
                "auth service answered HTTP {}",
                status.as_u16()
            )));
        }

        let info: UserResponse = response.json().await.map_err(|e| {
            AuthError::ProviderUnavailable(format!("user response parse failed: {e}"))
        })?;
        let email = info
            .email
            .filter(|e| !e.is_empty())
            .ok_or(AuthError::MissingEmail)?;

        check_domain(&email, domain)?;

        log::info!("Token validated for {email}");

        Ok(AuthenticatedUser {
            user_id: info.id,
            email,
        })
    }
}

impl TokenValidator for HostedTokenValidator {
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticatedUser, AuthError>> + Send + '_>> {
        let token = token.to_string();
        let domain = config.domain.clone();
        Box::pin(async move { self.validate_token(&token, &domain).await })
    }
}
