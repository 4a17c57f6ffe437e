//! Store traits, one per entity family.
//!
//! Every method that touches tenant data takes the [`RestaurantId`] and the
//! backends filter on it; a record from another tenant behaves exactly like
//! a missing one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gastro_core::customers::{Customer, NewCustomer, VisitRecord};
use gastro_core::loyalty::{Redemption, Reward, RewardDraft};
use gastro_core::promotions::{Coupon, CouponDraft};
use gastro_core::reservations::{NewReservation, Reservation, ReservationStatus};
use gastro_core::restaurant::{Restaurant, SettingsUpdate};
use gastro_core::reviews::{ReplyUpdate, Review};
use gastro_core::{
    CouponId, CustomerId, RedemptionId, ReservationId, RestaurantId, Result, ReviewId, RewardId,
    UserId,
};
use std::collections::HashMap;

/// Restaurant rows and tenant membership.
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    /// Restaurant the user belongs to, if any.
    async fn restaurant_for_user(&self, user: UserId) -> Result<Option<RestaurantId>>;

    /// Restaurant row.
    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>>;

    /// Writes editable settings and returns the updated row.
    async fn update_settings(
        &self,
        id: RestaurantId,
        update: &SettingsUpdate,
    ) -> Result<Option<Restaurant>>;
}

/// Time range and state filter for reservation queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationQuery {
    /// Earliest booked time, inclusive.
    pub from: Option<DateTime<Utc>>,
    /// Latest booked time, inclusive.
    pub to: Option<DateTime<Utc>>,
    /// Only this state.
    pub status: Option<ReservationStatus>,
    /// Leave out cancelled reservations.
    pub exclude_cancelled: bool,
}

impl ReservationQuery {
    /// Every reservation of the tenant.
    pub fn all() -> Self {
        Self::default()
    }

    /// Reservations booked inside `[from, to]`.
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    /// Restricts to one state.
    pub fn with_status(mut self, status: ReservationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Leaves out cancelled reservations.
    pub fn active_only(mut self) -> Self {
        self.exclude_cancelled = true;
        self
    }

    /// Whether a reservation satisfies the query (tenant not included).
    pub fn matches(&self, r: &Reservation) -> bool {
        self.from.is_none_or(|from| r.fecha_hora_reserva >= from)
            && self.to.is_none_or(|to| r.fecha_hora_reserva <= to)
            && self.status.is_none_or(|s| r.estado == s)
            && !(self.exclude_cancelled && r.estado == ReservationStatus::Cancelled)
    }
}

/// Reservations.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Reservations matching the query, earliest first.
    async fn list_reservations(
        &self,
        restaurant: RestaurantId,
        query: &ReservationQuery,
    ) -> Result<Vec<Reservation>>;

    /// Number of reservations matching the query.
    async fn count_reservations(
        &self,
        restaurant: RestaurantId,
        query: &ReservationQuery,
    ) -> Result<usize>;

    /// One reservation.
    async fn get_reservation(
        &self,
        restaurant: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>>;

    /// Inserts a reservation.
    async fn insert_reservation(&self, reservation: &NewReservation) -> Result<Reservation>;

    /// Changes the state. `None` when no such reservation exists.
    async fn update_reservation_status(
        &self,
        restaurant: RestaurantId,
        id: ReservationId,
        status: ReservationStatus,
    ) -> Result<Option<Reservation>>;

    /// Records attendance only while it is still unset.
    ///
    /// Returns `None` when the reservation does not exist or attendance was
    /// already recorded.
    async fn record_attendance(
        &self,
        restaurant: RestaurantId,
        id: ReservationId,
        attended: bool,
    ) -> Result<Option<Reservation>>;

    /// Most recent non-empty email each customer booked with.
    async fn latest_emails(
        &self,
        restaurant: RestaurantId,
        customers: &[CustomerId],
    ) -> Result<HashMap<CustomerId, String>>;
}

/// Customers and their visit history.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// All customers, most recent visit first.
    async fn list_customers(&self, restaurant: RestaurantId) -> Result<Vec<Customer>>;

    /// Number of customers created inside `[from, to]`.
    async fn count_customers_created(
        &self,
        restaurant: RestaurantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<usize>;

    /// One customer.
    async fn get_customer(
        &self,
        restaurant: RestaurantId,
        id: CustomerId,
    ) -> Result<Option<Customer>>;

    /// Several customers by id.
    async fn customers_by_ids(
        &self,
        restaurant: RestaurantId,
        ids: &[CustomerId],
    ) -> Result<Vec<Customer>>;

    /// Customer with this phone number.
    async fn find_customer_by_phone(
        &self,
        restaurant: RestaurantId,
        phone: &str,
    ) -> Result<Option<Customer>>;

    /// Customer with this normalised name.
    async fn find_customer_by_name(
        &self,
        restaurant: RestaurantId,
        normalized: &str,
    ) -> Result<Option<Customer>>;

    /// Customer owning a public rewards-page token (any tenant).
    async fn find_customer_by_token(&self, token: &str) -> Result<Option<Customer>>;

    /// Inserts a customer.
    async fn insert_customer(&self, customer: &NewCustomer) -> Result<Customer>;

    /// Bumps the visit counter (`increment_client_visit`).
    async fn increment_visit(&self, customer: CustomerId) -> Result<()>;

    /// Appends a history row.
    async fn append_visit(&self, visit: &VisitRecord) -> Result<()>;

    /// Inserts or replaces the history row of a reservation.
    async fn upsert_reservation_visit(&self, visit: &VisitRecord) -> Result<()>;

    /// History of one customer, newest first.
    async fn list_visits(
        &self,
        restaurant: RestaurantId,
        customer: CustomerId,
    ) -> Result<Vec<VisitRecord>>;
}

/// Reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// All reviews, newest first.
    async fn list_reviews(&self, restaurant: RestaurantId) -> Result<Vec<Review>>;

    /// Stores a drafted reply.
    async fn save_reply(
        &self,
        restaurant: RestaurantId,
        id: ReviewId,
        reply: &ReplyUpdate,
    ) -> Result<Option<Review>>;
}

/// Points balance, reward catalogue and redemptions.
#[async_trait]
pub trait LoyaltyStore: Send + Sync {
    /// Current balance (0 for customers without movements).
    async fn balance(&self, restaurant: RestaurantId, customer: CustomerId) -> Result<i64>;

    /// Catalogue, cheapest first.
    async fn list_rewards(&self, restaurant: RestaurantId, active_only: bool)
    -> Result<Vec<Reward>>;

    /// Several rewards by id.
    async fn rewards_by_ids(&self, restaurant: RestaurantId, ids: &[RewardId])
    -> Result<Vec<Reward>>;

    /// Adds a reward (active).
    async fn insert_reward(&self, restaurant: RestaurantId, draft: &RewardDraft) -> Result<Reward>;

    /// Rewrites a reward.
    async fn update_reward(
        &self,
        restaurant: RestaurantId,
        id: RewardId,
        draft: &RewardDraft,
    ) -> Result<Option<Reward>>;

    /// Switches a reward on or off.
    async fn set_reward_active(
        &self,
        restaurant: RestaurantId,
        id: RewardId,
        active: bool,
    ) -> Result<Option<Reward>>;

    /// Removes a reward. Returns whether a row was deleted.
    async fn delete_reward(&self, restaurant: RestaurantId, id: RewardId) -> Result<bool>;

    /// Redemptions, newest first, optionally for one customer.
    async fn list_redemptions(
        &self,
        restaurant: RestaurantId,
        customer: Option<CustomerId>,
    ) -> Result<Vec<Redemption>>;

    /// Credits points for a spend (`rpc_registrar_gasto`) and returns the
    /// points actually credited, 0 when the programme is off.
    async fn register_spend(
        &self,
        restaurant: RestaurantId,
        customer: CustomerId,
        amount: f64,
    ) -> Result<i64>;

    /// Redeems a reward (`rpc_canjear_premio`).
    async fn redeem(
        &self,
        restaurant: RestaurantId,
        customer: CustomerId,
        reward: RewardId,
    ) -> Result<()>;

    /// Confirms a pending redemption (`rpc_confirmar_canje`).
    async fn confirm_redemption(&self, restaurant: RestaurantId, id: RedemptionId) -> Result<()>;

    /// Cancels a pending redemption and refunds it (`rpc_cancelar_canje`).
    async fn cancel_redemption(&self, restaurant: RestaurantId, id: RedemptionId) -> Result<()>;
}

/// Automatic promotions.
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Coupons, newest first.
    async fn list_coupons(&self, restaurant: RestaurantId, active_only: bool)
    -> Result<Vec<Coupon>>;

    /// Adds a coupon.
    async fn insert_coupon(&self, restaurant: RestaurantId, draft: &CouponDraft) -> Result<Coupon>;

    /// Rewrites a coupon.
    async fn update_coupon(
        &self,
        restaurant: RestaurantId,
        id: CouponId,
        draft: &CouponDraft,
    ) -> Result<Option<Coupon>>;

    /// Switches a coupon on or off.
    async fn set_coupon_active(
        &self,
        restaurant: RestaurantId,
        id: CouponId,
        active: bool,
    ) -> Result<Option<Coupon>>;

    /// Removes a coupon. Returns whether a row was deleted.
    async fn delete_coupon(&self, restaurant: RestaurantId, id: CouponId) -> Result<bool>;
}

/// Everything the back-office needs from persistence.
pub trait Store:
    RestaurantStore + ReservationStore + CustomerStore + ReviewStore + LoyaltyStore + CouponStore
{
    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}
