#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Gastro Core Library
//!
//! Everything here is synchronous and side-effect free; the store and
//! service crates feed it rows and a clock.

pub mod alerts;
pub mod customers;
pub mod error;
pub mod ids;
pub mod loyalty;
pub mod occupancy;
pub mod promotions;
pub mod reservations;
pub mod restaurant;
pub mod reviews;
pub mod schedule;

mod proptests;

// Re-exports for convenience
pub use error::{Error, Result};
pub use ids::{
    CouponId, CustomerId, RedemptionId, ReservationId, RestaurantId, ReviewId, RewardId, UserId,
};
pub use occupancy::{DayOccupancy, Slot};
pub use restaurant::Restaurant;
pub use schedule::ServiceWindow;
