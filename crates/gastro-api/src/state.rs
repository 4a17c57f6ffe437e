//! Shared handler state.

use gastro_core::UserId;
use gastro_service::BackOffice;
use std::fmt;
use std::sync::Arc;

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Back-office operations.
    pub office: Arc<BackOffice>,
    /// User assumed for panel routes when authentication is disabled.
    pub dev_user: Option<UserId>,
}

impl AppState {
    /// State without a development user.
    pub fn new(office: Arc<BackOffice>) -> Self {
        Self {
            office,
            dev_user: None,
        }
    }

    /// Serves unauthenticated panel requests as `user`.
    pub fn with_dev_user(mut self, user: UserId) -> Self {
        self.dev_user = Some(user);
        self
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("office", &self.office)
            .field("dev_user", &self.dev_user)
            .finish()
    }
}
