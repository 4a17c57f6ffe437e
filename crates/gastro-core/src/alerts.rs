//! Dashboard actions, alerts and impact counters.
//!
//! All of these are derived from counts the dashboard already loads; nothing
//! here is persisted.

use crate::reservations::{Reservation, ReservationStatus};
use crate::reviews::Review;
use crate::schedule::ServiceWindow;
use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Busiest part of lunch (13:30 to 15:30, inclusive).
pub const PEAK_LUNCH: ServiceWindow = ServiceWindow {
    start: 13 * 60 + 30,
    end: 15 * 60 + 30,
};

/// Busiest part of dinner (20:30 to 22:30, inclusive).
pub const PEAK_DINNER: ServiceWindow = ServiceWindow {
    start: 20 * 60 + 30,
    end: 22 * 60 + 30,
};

/// Headline occupancy from which a service counts as full.
pub const FULL_PCT: u32 = 100;

/// Headline occupancy from which a service counts as nearly full.
pub const NEARLY_FULL_PCT: u32 = 85;

/// Whether a local minute of day falls in a peak window.
pub fn is_peak_minute(minute: u32) -> bool {
    PEAK_LUNCH.contains_inclusive(minute) || PEAK_DINNER.contains_inclusive(minute)
}

/// Cancelled reservations whose booked time falls in a peak window.
pub fn peak_cancellations<Tz: TimeZone>(reservations: &[Reservation], tz: &Tz) -> usize {
    reservations
        .iter()
        .filter(|r| r.estado == ReservationStatus::Cancelled)
        .filter(|r| is_peak_minute(r.local_minute(tz)))
        .count()
}

/// Something staff should do now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Reply to pending reviews.
    RespondReviews {
        /// Pending reviews.
        count: usize,
    },
    /// Confirm pending reservations.
    ConfirmReservations {
        /// Pending reservations.
        count: usize,
    },
}

impl Action {
    /// Rough time the action takes, in minutes.
    pub fn estimated_minutes(&self) -> u32 {
        match self {
            Action::RespondReviews { .. } => 5,
            Action::ConfirmReservations { .. } => 1,
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::RespondReviews { count } => write!(f, "Respond {}", plural(*count, "review")),
            Action::ConfirmReservations { count } => {
                write!(f, "Confirm {}", plural(*count, "reservation"))
            }
        }
    }
}

/// Something staff should know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    /// A low-rated review has no reply.
    NegativeReview {
        /// Stars.
        rating: u8,
    },
    /// Reservations in a peak window were cancelled.
    PeakCancellation {
        /// How many.
        count: usize,
    },
    /// Current service at or above capacity.
    ServiceFull {
        /// Headline percentage.
        pct: u32,
    },
    /// Current service close to capacity.
    NearlyFull {
        /// Headline percentage.
        pct: u32,
    },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::NegativeReview { rating } => write!(f, "{rating}★ review without reply"),
            Alert::PeakCancellation { .. } => write!(f, "Cancellation in a peak slot"),
            Alert::ServiceFull { .. } => write!(f, "Service full (100% capacity)"),
            Alert::NearlyFull { .. } => write!(f, "Service nearly full (85%+ occupancy)"),
        }
    }
}

/// Actions for the given pending counts, in display order.
pub fn derive_actions(pending_reviews: usize, pending_reservations: usize) -> Vec<Action> {
    let mut actions = Vec::new();
    if pending_reviews > 0 {
        actions.push(Action::RespondReviews {
            count: pending_reviews,
        });
    }
    if pending_reservations > 0 {
        actions.push(Action::ConfirmReservations {
            count: pending_reservations,
        });
    }
    actions
}

/// Alerts: one per unanswered negative review, then peak cancellations,
/// then at most one occupancy alert.
pub fn derive_alerts(reviews: &[Review], peak_cancellations: usize, headline_pct: u32) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = reviews
        .iter()
        .filter(|r| r.is_pending() && r.is_negative())
        .map(|r| Alert::NegativeReview { rating: r.rating })
        .collect();

    if peak_cancellations > 0 {
        alerts.push(Alert::PeakCancellation {
            count: peak_cancellations,
        });
    }

    if headline_pct >= FULL_PCT {
        alerts.push(Alert::ServiceFull { pct: headline_pct });
    } else if headline_pct >= NEARLY_FULL_PCT {
        alerts.push(Alert::NearlyFull { pct: headline_pct });
    }
    alerts
}

/// Impact counters under the alerts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impact {
    /// Peak-window cancellations.
    pub peak_gaps: usize,
    /// Reservations still pending confirmation.
    pub at_risk: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ids::{RestaurantId, ReviewId};
    use crate::reservations::tests::reservation;
    use chrono::Utc;
    use chrono_tz::Europe::Madrid;

    fn review(rating: u8, responded: bool) -> Review {
        Review {
            id: ReviewId::new(),
            restaurante_id: RestaurantId::new(),
            google_review_id: None,
            nombre_cliente: None,
            rating,
            comentario: None,
            responded,
            respuesta_texto: None,
            fecha_resena: None,
        }
    }

    #[test]
    fn test_peak_minutes_inclusive() {
        assert!(is_peak_minute(810));
        assert!(is_peak_minute(930));
        assert!(!is_peak_minute(931));
        assert!(is_peak_minute(1230));
        assert!(is_peak_minute(1350));
        assert!(!is_peak_minute(1229));
    }

    #[test]
    fn test_peak_cancellations_count_only_cancelled_in_local_time() {
        // 12:45 UTC in October is 14:45 in Madrid
        let peak = Utc.with_ymd_and_hms(2026, 10, 16, 12, 45, 0).unwrap();
        // 10:00 UTC is 12:00 local, outside peak
        let calm = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap();
        let rs = vec![
            reservation(peak, 2, ReservationStatus::Cancelled),
            reservation(peak, 2, ReservationStatus::Confirmed),
            reservation(calm, 2, ReservationStatus::Cancelled),
        ];
        assert_eq!(peak_cancellations(&rs, &Madrid), 1);
    }

    #[test]
    fn test_actions() {
        assert!(derive_actions(0, 0).is_empty());
        let a = derive_actions(1, 3);
        assert_eq!(a[0].to_string(), "Respond 1 review");
        assert_eq!(a[1].to_string(), "Confirm 3 reservations");
        assert_eq!(a[0].estimated_minutes(), 5);
    }

    #[test]
    fn test_alerts_order_and_occupancy_thresholds() {
        let reviews = vec![review(1, false), review(2, true), review(4, false)];
        let alerts = derive_alerts(&reviews, 2, 90);
        assert_eq!(
            alerts,
            vec![
                Alert::NegativeReview { rating: 1 },
                Alert::PeakCancellation { count: 2 },
                Alert::NearlyFull { pct: 90 },
            ]
        );

        assert_eq!(derive_alerts(&[], 0, 100), vec![Alert::ServiceFull { pct: 100 }]);
        assert!(derive_alerts(&[], 0, 84).is_empty());
    }

    #[test]
    fn test_alert_serializes_tagged() {
        let v = serde_json::to_value(Alert::ServiceFull { pct: 120 }).unwrap();
        assert_eq!(v, serde_json::json!({"kind": "service_full", "pct": 120}));
    }
}
