use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use gastro_core::CouponId;
use gastro_core::promotions::{Coupon, CouponInput};
use http::StatusCode;

use super::ActiveBody;
use crate::error::ApiResult;
use crate::extract::{Body, CurrentTenant, Param};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/coupons", get(list).post(create))
        .route("/coupons/{id}", put(update).delete(delete))
        .route("/coupons/{id}/active", put(set_active))
}

async fn list(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<Vec<Coupon>>> {
    Ok(Json(state.office.list_coupons(&tenant).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Body(input): Body<CouponInput>,
) -> ApiResult<(StatusCode, Json<Coupon>)> {
    let coupon = state.office.create_coupon(&tenant, input).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

async fn update(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<CouponId>,
    Body(input): Body<CouponInput>,
) -> ApiResult<Json<Coupon>> {
    Ok(Json(state.office.update_coupon(&tenant, id, input).await?))
}

async fn set_active(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<CouponId>,
    Body(body): Body<ActiveBody>,
) -> ApiResult<Json<Coupon>> {
    Ok(Json(
        state
            .office
            .set_coupon_active(&tenant, id, body.active)
            .await?,
    ))
}

async fn delete(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<CouponId>,
) -> ApiResult<StatusCode> {
    state.office.delete_coupon(&tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
