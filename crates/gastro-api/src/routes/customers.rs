use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use gastro_core::CustomerId;
use gastro_core::customers::{VisitInput, VisitRecord, WalkInInput};
use gastro_service::{CustomerDetail, CustomerList, WalkInOutcome};
use http::StatusCode;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentTenant, Param};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list))
        .route("/customers/walk-ins", post(walk_in))
        .route("/customers/{id}", get(detail))
        .route("/customers/{id}/visits", post(add_visit))
}

async fn list(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<CustomerList>> {
    Ok(Json(state.office.list_customers(&tenant).await?))
}

async fn detail(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<CustomerId>,
) -> ApiResult<Json<CustomerDetail>> {
    Ok(Json(state.office.customer_detail(&tenant, id).await?))
}

async fn walk_in(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Body(input): Body<WalkInInput>,
) -> ApiResult<(StatusCode, Json<WalkInOutcome>)> {
    let outcome = state.office.register_walk_in(&tenant, input).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

async fn add_visit(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<CustomerId>,
    Body(input): Body<VisitInput>,
) -> ApiResult<(StatusCode, Json<VisitRecord>)> {
    let visit = state.office.add_visit(&tenant, id, input).await?;
    Ok((StatusCode::CREATED, Json(visit)))
}
