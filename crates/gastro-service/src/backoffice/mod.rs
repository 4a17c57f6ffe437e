//! The back-office facade.
//!
//! Operations are grouped by area in submodules, all as methods on
//! [`BackOffice`]. Tenant-scoped methods take a [`Tenant`] and never touch
//! rows of another restaurant.

mod coupons;
mod customers;
mod dashboard;
mod loyalty;
mod occupancy;
mod public;
mod reservations;
mod reviews;
mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use customers::{CustomerDetail, CustomerList, CustomerRow, WalkInOutcome};
pub use dashboard::Dashboard;
pub use public::{PublicPage, PublicRedemption, Promotion, RedeemOutcome};
pub use reservations::AttendanceOutcome;

use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::events::{ChangeEvent, ChangeKind, EventBus};
use crate::notify::{NoopNotifier, Notification, Notifier};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use gastro_core::{Error, ReservationId, RestaurantId, Result, UserId};
use gastro_core::restaurant::Restaurant;
use gastro_store::Store;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

/// The caller's restaurant, resolved from their membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    /// Authenticated user.
    pub user: UserId,
    /// Restaurant the user belongs to.
    pub restaurant: RestaurantId,
}

/// Entry point for every back-office operation.
pub struct BackOffice {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    events: EventBus,
    tz: Tz,
    slack_threshold: u32,
    attendance_in_flight: Mutex<HashSet<ReservationId>>,
}

impl BackOffice {
    /// Creates a back-office over `store` with the wall clock and no webhooks.
    pub fn new(store: Arc<dyn Store>, config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            store,
            clock: Arc::new(SystemClock),
            notifier: Arc::new(NoopNotifier),
            events: EventBus::default(),
            tz: config.tz()?,
            slack_threshold: config.slack_threshold,
            attendance_in_flight: Mutex::new(HashSet::new()),
        })
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the webhook notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Publishes into an existing bus instead of a private one.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Change feed.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Store backend.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Zone in which days and service hours are evaluated.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Current instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current local date and time.
    pub fn local_now(&self) -> NaiveDateTime {
        self.now().with_timezone(&self.tz).naive_local()
    }

    /// Current local date.
    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    // ------------------------------------------------------------------------
    // Tenant resolution
    // ------------------------------------------------------------------------

    /// Resolves the restaurant of an authenticated user.
    ///
    /// Users without a membership get [`Error::Forbidden`].
    pub async fn resolve_tenant(&self, user: UserId) -> Result<Tenant> {
        match self.store.restaurant_for_user(user).await? {
            Some(restaurant) => Ok(Tenant { user, restaurant }),
            None => {
                tracing::warn!(%user, "User has no restaurant");
                Err(Error::forbidden("user has no restaurant"))
            }
        }
    }

    async fn restaurant(&self, tenant: &Tenant) -> Result<Restaurant> {
        self.store
            .get_restaurant(tenant.restaurant)
            .await?
            .ok_or_else(|| Error::not_found("restaurant", tenant.restaurant))
    }

    // ------------------------------------------------------------------------
    // Side channels
    // ------------------------------------------------------------------------

    fn publish(&self, restaurant: RestaurantId, kind: ChangeKind) {
        self.events.publish(ChangeEvent {
            restaurant_id: restaurant,
            kind,
            at: self.now(),
        });
    }

    async fn notify(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(&notification).await {
            tracing::warn!(
                hook = notification.path(),
                notifier = self.notifier.name(),
                error = %e,
                "Webhook failed"
            );
        }
    }

    fn claim_attendance(&self, id: ReservationId) -> Result<AttendanceClaim<'_>> {
        let mut in_flight = self
            .attendance_in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(id) {
            return Err(Error::conflict(
                "attendance for this reservation is already being recorded",
            ));
        }
        Ok(AttendanceClaim {
            in_flight: &self.attendance_in_flight,
            id,
        })
    }
}

impl fmt::Debug for BackOffice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackOffice")
            .field("store", &self.store.name())
            .field("notifier", &self.notifier.name())
            .field("timezone", &self.tz)
            .field("slack_threshold", &self.slack_threshold)
            .finish()
    }
}

/// Marks a reservation's attendance as in flight until dropped.
struct AttendanceClaim<'a> {
    in_flight: &'a Mutex<HashSet<ReservationId>>,
    id: ReservationId,
}

impl Drop for AttendanceClaim<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}
