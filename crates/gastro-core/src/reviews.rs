//! Reviews and the reply workflow.
//!
//! Replies are drafted here and published by the external automation, which
//! is also what flips `responded` once the reply is live.

use crate::error::{Error, Result};
use crate::ids::{RestaurantId, ReviewId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ratings at or below this count as negative.
pub const NEGATIVE_RATING: u8 = 2;

/// A review (`resenas` row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review id.
    pub id: ReviewId,
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Id on the review platform.
    #[serde(default)]
    pub google_review_id: Option<String>,
    /// Reviewer name.
    #[serde(default)]
    pub nombre_cliente: Option<String>,
    /// Stars, 1 to 5.
    pub rating: u8,
    /// Review text.
    #[serde(default)]
    pub comentario: Option<String>,
    /// Whether the reply has been published.
    #[serde(default)]
    pub responded: bool,
    /// Drafted reply.
    #[serde(default)]
    pub respuesta_texto: Option<String>,
    /// When the review was written.
    #[serde(rename = "fecha_reseña", default)]
    pub fecha_resena: Option<DateTime<Utc>>,
}

impl Review {
    /// Low rating.
    pub fn is_negative(&self) -> bool {
        self.rating <= NEGATIVE_RATING
    }

    /// Waiting for a published reply.
    pub fn is_pending(&self) -> bool {
        !self.responded
    }
}

/// Reply form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyInput {
    /// Reply text.
    pub text: String,
}

/// Reply fields written to the review row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyUpdate {
    /// Reply text.
    pub respuesta_texto: String,
    /// Stays false until the automation publishes the reply.
    pub responded: bool,
}

impl ReplyInput {
    /// Validates the reply text.
    pub fn validate(self) -> Result<ReplyUpdate> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(Error::validation_field("text", "must not be empty"));
        }
        Ok(ReplyUpdate {
            respuesta_texto: text,
            responded: false,
        })
    }
}

/// Review counters for the sidebar and dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCounters {
    /// Reviews without a published reply.
    pub pending: usize,
    /// Pending reviews rated at or below [`NEGATIVE_RATING`].
    pub negative_pending: usize,
}

impl ReviewCounters {
    /// Counts a review list.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        Self {
            pending: reviews.iter().filter(|r| r.is_pending()).count(),
            negative_pending: reviews
                .iter()
                .filter(|r| r.is_pending() && r.is_negative())
                .count(),
        }
    }
}
