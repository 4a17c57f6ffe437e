//! Fixed token table for local runs and tests.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::{AuthConfig, AuthError, AuthenticatedUser, TokenValidator, check_domain};

/// Accepts only the tokens it was built with.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenValidator {
    tokens: HashMap<String, AuthenticatedUser>,
}

impl StaticTokenValidator {
    /// Empty table; every token is rejected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token for `user`.
    pub fn with_token(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }

    /// Number of known tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenValidator for StaticTokenValidator {
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticatedUser, AuthError>> + Send + '_>> {
        let result = self
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("unknown token".to_string()))
            .and_then(|user| {
                check_domain(&user.email, &config.domain)?;
                Ok(user)
            });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gastro_core::UserId;

    #[tokio::test]
    async fn test_known_and_unknown_tokens() {
        let id = UserId::new();
        let v = StaticTokenValidator::new().with_token(
            "dev",
            AuthenticatedUser {
                user_id: id,
                email: "dev@localhost".into(),
            },
        );
        assert_eq!(v.len(), 1);

        let config = AuthConfig::default();
        assert_eq!(v.validate("dev", &config).await.unwrap().user_id, id);
        assert!(matches!(
            v.validate("other", &config).await,
            Err(AuthError::InvalidToken(_))
        ));
    }
}
