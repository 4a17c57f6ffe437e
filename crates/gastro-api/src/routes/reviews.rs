use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use gastro_core::ReviewId;
use gastro_core::reviews::{ReplyInput, Review, ReviewCounters};

use crate::error::ApiResult;
use crate::extract::{Body, CurrentTenant, Param};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", get(list))
        .route("/reviews/counters", get(counters))
        .route("/reviews/{id}/reply", put(reply))
}

async fn list(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<Vec<Review>>> {
    Ok(Json(state.office.list_reviews(&tenant).await?))
}

async fn counters(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<ReviewCounters>> {
    Ok(Json(state.office.review_counters(&tenant).await?))
}

async fn reply(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<ReviewId>,
    Body(input): Body<ReplyInput>,
) -> ApiResult<Json<Review>> {
    Ok(Json(state.office.save_reply(&tenant, id, input).await?))
}
