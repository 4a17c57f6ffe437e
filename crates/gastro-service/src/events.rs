//! Change feed.
//!
//! Every mutation publishes a [`ChangeEvent`] so open dashboards can re-fetch
//! the counts derived from the changed records. Delivery is best effort: a
//! subscriber that falls behind skips the events it missed.

use chrono::{DateTime, Utc};
use gastro_core::reservations::ReservationStatus;
use gastro_core::{CouponId, CustomerId, RedemptionId, ReservationId, RestaurantId, ReviewId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Default number of buffered events per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// What changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    /// A reservation was booked.
    ReservationCreated {
        /// New reservation.
        reservation_id: ReservationId,
    },
    /// A reservation changed state.
    ReservationStatusChanged {
        /// Reservation.
        reservation_id: ReservationId,
        /// New state.
        status: ReservationStatus,
    },
    /// Attendance was recorded.
    AttendanceRecorded {
        /// Reservation.
        reservation_id: ReservationId,
        /// Whether the party showed up.
        attended: bool,
    },
    /// A customer was created or got a new visit.
    CustomerChanged {
        /// Customer.
        customer_id: CustomerId,
    },
    /// A review reply was saved.
    ReviewReplied {
        /// Review.
        review_id: ReviewId,
    },
    /// The reward catalogue changed.
    RewardsChanged,
    /// A redemption was created, confirmed or cancelled.
    RedemptionChanged {
        /// Redemption, when known.
        redemption_id: Option<RedemptionId>,
    },
    /// A coupon was created, changed or removed.
    CouponsChanged {
        /// Coupon.
        coupon_id: CouponId,
    },
    /// Restaurant settings were saved.
    SettingsChanged,
}

/// A change scoped to one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Tenant the change belongs to.
    pub restaurant_id: RestaurantId,
    /// What changed.
    #[serde(flatten)]
    pub kind: ChangeKind,
    /// When it was published.
    pub at: DateTime<Utc>,
}

/// Fan-out channel for [`ChangeEvent`]s.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// Creates a bus buffering `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event. Returns how many subscribers received it.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        tracing::debug!(restaurant = %event.restaurant_id, kind = ?event.kind, "Change published");
        // No subscribers is not an error.
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribes to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Current number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
