//! Authenticated user identity and extraction helpers.

use gastro_core::UserId;

/// An authenticated user identity, extracted from a validated token.
///
/// Stored in HTTP request extensions by the auth middleware; the API maps
/// it to a restaurant membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Hosted-auth user id.
    pub user_id: UserId,
    /// The user's email address.
    pub email: String,
}

/// Extract the `AuthenticatedUser` from HTTP request `Parts`, if present.
pub fn user_from_parts(parts: &http::request::Parts) -> Option<&AuthenticatedUser> {
    parts.extensions.get::<AuthenticatedUser>()
}

/// Extract the user's email from HTTP request `Parts`.
///
/// Returns `"anonymous"` if no authenticated user is present (auth disabled).
pub fn email_from_parts(parts: &http::request::Parts) -> &str {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .map(|u| u.email.as_str())
        .unwrap_or("anonymous")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parts_with_user(id: UserId) -> http::request::Parts {
        let (mut parts, _body) = http::Request::new(()).into_parts();
        parts.extensions.insert(AuthenticatedUser {
            user_id: id,
            email: "ana@casapepe.es".to_string(),
        });
        parts
    }

    fn parts_without_user() -> http::request::Parts {
        let (parts, _body) = http::Request::new(()).into_parts();
        parts
    }

    #[test]
    fn test_user_from_parts_present() {
        let id = UserId::new();
        let parts = parts_with_user(id);
        let user = user_from_parts(&parts).unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.email, "ana@casapepe.es");
    }

    #[test]
    fn test_user_from_parts_absent() {
        let parts = parts_without_user();
        assert!(user_from_parts(&parts).is_none());
    }

    #[test]
    fn test_email_from_parts_present() {
        let parts = parts_with_user(UserId::new());
        assert_eq!(email_from_parts(&parts), "ana@casapepe.es");
    }

    #[test]
    fn test_email_from_parts_anonymous() {
        let parts = parts_without_user();
        assert_eq!(email_from_parts(&parts), "anonymous");
    }
}
