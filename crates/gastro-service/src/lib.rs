#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Gastro Service
//!
//! Tenant-scoped back-office operations over a [`gastro_store::Store`].

pub mod backoffice;
pub mod clock;
pub mod config;
pub mod events;
pub mod notify;

pub use backoffice::{
    AttendanceOutcome, BackOffice, CustomerDetail, CustomerList, CustomerRow, Dashboard,
    Promotion, PublicPage, PublicRedemption, RedeemOutcome, Tenant, WalkInOutcome,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ServiceConfig;
pub use events::{ChangeEvent, ChangeKind, EventBus};
pub use notify::{
    HttpWebhook, NoopNotifier, Notification, Notifier, RecordingNotifier, WebhookConfig,
    create_notifier,
};
