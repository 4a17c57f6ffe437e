use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use gastro_core::loyalty::{RedemptionBoard, Reward, RewardInput};
use gastro_core::{RedemptionId, RewardId};
use http::StatusCode;

use super::ActiveBody;
use crate::error::ApiResult;
use crate::extract::{Body, CurrentTenant, Param};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/rewards", get(list_rewards).post(create_reward))
        .route("/rewards/{id}", put(update_reward).delete(delete_reward))
        .route("/rewards/{id}/active", put(set_reward_active))
        .route("/redemptions", get(board))
        .route("/redemptions/{id}/confirm", post(confirm))
        .route("/redemptions/{id}/cancel", post(cancel))
}

async fn list_rewards(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<Vec<Reward>>> {
    Ok(Json(state.office.list_rewards(&tenant).await?))
}

async fn create_reward(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Body(input): Body<RewardInput>,
) -> ApiResult<(StatusCode, Json<Reward>)> {
    let reward = state.office.create_reward(&tenant, input).await?;
    Ok((StatusCode::CREATED, Json(reward)))
}

async fn update_reward(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<RewardId>,
    Body(input): Body<RewardInput>,
) -> ApiResult<Json<Reward>> {
    Ok(Json(state.office.update_reward(&tenant, id, input).await?))
}

async fn set_reward_active(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<RewardId>,
    Body(body): Body<ActiveBody>,
) -> ApiResult<Json<Reward>> {
    Ok(Json(
        state
            .office
            .set_reward_active(&tenant, id, body.active)
            .await?,
    ))
}

async fn delete_reward(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<RewardId>,
) -> ApiResult<StatusCode> {
    state.office.delete_reward(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn board(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<RedemptionBoard>> {
    Ok(Json(state.office.redemption_board(&tenant).await?))
}

async fn confirm(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<RedemptionId>,
) -> ApiResult<StatusCode> {
    state.office.confirm_redemption(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cancel(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<RedemptionId>,
) -> ApiResult<StatusCode> {
    state.office.cancel_redemption(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
