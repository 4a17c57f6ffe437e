//! Customer-facing loyalty page.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use gastro_core::RewardId;
use gastro_service::{PublicPage, RedeemOutcome};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extract::{Body, Param};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers/{token}", get(page))
        .route("/customers/{token}/redeem", post(redeem))
}

#[derive(Debug, Deserialize)]
struct RedeemBody {
    reward_id: RewardId,
}

async fn page(
    State(state): State<AppState>,
    Param(token): Param<String>,
) -> ApiResult<Json<PublicPage>> {
    Ok(Json(state.office.public_page(&token).await?))
}

/// Redeems a reward; business failures come back as `ok: false` with a code.
async fn redeem(
    State(state): State<AppState>,
    Param(token): Param<String>,
    Body(body): Body<RedeemBody>,
) -> ApiResult<Json<RedeemOutcome>> {
    Ok(Json(state.office.public_redeem(&token, body.reward_id).await?))
}
