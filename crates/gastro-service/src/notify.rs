//! Workflow-automation webhooks.
//!
//! Two hooks exist: one when a reservation changes state and one asking the
//! automation to email a review request after a visit. Delivery failures are
//! reported to the caller, which logs them and carries on.

use async_trait::async_trait;
use gastro_core::reservations::ReservationStatus;
use gastro_core::{CustomerId, Error, ReservationId, RestaurantId, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Path of the reservation-state hook under the base URL.
pub const STATUS_CHANGED_PATH: &str = "reserva-estado-cambiado";

/// Path of the review-request hook under the base URL.
pub const REVIEW_REQUEST_PATH: &str = "resena-email";

/// Body of the reservation-state hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChanged {
    /// Reservation.
    pub reserva_id: ReservationId,
    /// New state.
    pub estado: ReservationStatus,
    /// Tenant.
    pub restaurante_id: RestaurantId,
}

/// Body of the review-request hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Reservation that was attended.
    pub reserva_id: ReservationId,
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Customer credited with the visit.
    pub cliente_id: CustomerId,
    /// Email given with the booking.
    pub email: Option<String>,
    /// Booking name.
    pub nombre: Option<String>,
    /// Booking phone.
    pub telefono: Option<String>,
    /// Whether a review was already requested for this reservation.
    pub resena_solicitada: bool,
    /// Whether the customer already left a review.
    pub ya_dejo_resena: bool,
    /// Spend entered at the table.
    pub gasto_eur: Option<f64>,
    /// Whether the points programme is on.
    pub puntos_activo: bool,
    /// Points per euro.
    pub puntos_por_euro: f64,
}

/// One outgoing webhook call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Notification {
    /// Reservation changed state.
    StatusChanged(StatusChanged),
    /// Ask for a review.
    ReviewRequest(ReviewRequest),
}

impl Notification {
    /// Path under the webhook base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Notification::StatusChanged(_) => STATUS_CHANGED_PATH,
            Notification::ReviewRequest(_) => REVIEW_REQUEST_PATH,
        }
    }
}

/// Delivers notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one notification.
    async fn notify(&self, notification: &Notification) -> Result<()>;

    /// Notifier name for diagnostics.
    fn name(&self) -> &str;
}

/// Webhook settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Whether webhooks are sent at all.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL; hook paths are appended to it.
    #[serde(default)]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Builds the notifier selected in `config`.
pub fn create_notifier(config: &WebhookConfig) -> Result<Arc<dyn Notifier>> {
    if !config.enabled {
        return Ok(Arc::new(NoopNotifier));
    }
    Ok(Arc::new(HttpWebhook::new(config)?))
}

// ============================================================================
// HttpWebhook
// ============================================================================

/// POSTs JSON to `{base_url}/{path}`.
#[derive(Debug, Clone)]
pub struct HttpWebhook {
    client: reqwest::Client,
    base: String,
}

impl HttpWebhook {
    /// Creates a webhook client.
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::config("webhook base URL is empty"));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::config(format!("webhook client: {e}")))?;
        Ok(Self {
            client,
            base: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, notification: &Notification) -> String {
        format!("{}/{}", self.base, notification.path())
    }
}

#[async_trait]
impl Notifier for HttpWebhook {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let url = self.url(notification);
        let response = self
            .client
            .post(&url)
            .json(notification)
            .send()
            .await
            .map_err(|e| Error::backend_with_source(format!("webhook {url} unreachable"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::backend(format!(
                "webhook {url} answered HTTP {}",
                status.as_u16()
            )));
        }
        tracing::debug!(%url, "Webhook delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ============================================================================
// NoopNotifier / RecordingNotifier
// ============================================================================

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn status_changed() -> (Notification, ReservationId) {
        let id = ReservationId::new();
        (
            Notification::StatusChanged(StatusChanged {
                reserva_id: id,
                estado: ReservationStatus::Confirmed,
                restaurante_id: RestaurantId::new(),
            }),
            id,
        )
    }

    fn config(base_url: String) -> WebhookConfig {
        WebhookConfig {
            enabled: true,
            base_url,
            timeout_secs: 2,
        }
    }

    #[tokio::test]
    async fn test_posts_to_hook_path() {
        let server = MockServer::start().await;
        let (notification, id) = status_changed();
        Mock::given(method("POST"))
            .and(path("/webhook/reserva-estado-cambiado"))
            .and(body_partial_json(serde_json::json!({
                "reserva_id": id.to_string(),
                "estado": "confirmada",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let hook = HttpWebhook::new(&config(format!("{}/webhook/", server.uri()))).unwrap();
        hook.notify(&notification).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let hook = HttpWebhook::new(&config(server.uri())).unwrap();
        let err = hook.notify(&status_changed().0).await.unwrap_err();
        assert!(matches!(err, Error::Backend { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_disabled_config_gives_noop() {
        let notifier = create_notifier(&WebhookConfig::default()).unwrap();
        assert_eq!(notifier.name(), "noop");
    }

    #[test]
    fn test_enabled_without_url_is_config_error() {
        let result = create_notifier(&config(String::new()));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_recording_notifier_keeps_order() {
        let recorder = RecordingNotifier::new();
        let (first, _) = status_changed();
        let (second, _) = status_changed();
        recorder.notify(&first).await.unwrap();
        recorder.notify(&second).await.unwrap();
        assert_eq!(recorder.sent(), vec![first, second]);
    }

    #[test]
    fn test_notification_paths() {
        assert_eq!(status_changed().0.path(), STATUS_CHANGED_PATH);
    }
}
