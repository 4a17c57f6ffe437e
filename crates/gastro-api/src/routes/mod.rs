//! Route tables.
//!
//! Panel routes sit behind the auth layer and resolve a [`CurrentTenant`];
//! public routes are keyed by the customer's token.
//!
//! [`CurrentTenant`]: crate::extract::CurrentTenant

mod coupons;
mod customers;
mod dashboard;
mod events;
mod loyalty;
mod occupancy;
mod public;
mod reservations;
mod reviews;
mod settings;

use axum::Router;
use serde::Deserialize;

use crate::state::AppState;

/// Tenant-scoped routes, relative to `/api`.
pub fn panel_routes() -> Router<AppState> {
    Router::new()
        .merge(dashboard::routes())
        .merge(reservations::routes())
        .merge(customers::routes())
        .merge(reviews::routes())
        .merge(loyalty::routes())
        .merge(coupons::routes())
        .merge(settings::routes())
        .merge(occupancy::routes())
        .merge(events::routes())
}

/// Customer-facing routes, relative to `/api/public`.
pub fn public_routes() -> Router<AppState> {
    public::routes()
}

/// Body of the on/off toggles.
#[derive(Debug, Clone, Copy, Deserialize)]
struct ActiveBody {
    active: bool,
}
