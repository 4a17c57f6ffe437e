use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use gastro_core::ReservationId;
use gastro_core::reservations::{
    AttendanceInput, DayCount, NewReservationInput, Reservation, ReservationCounters,
    ReservationFilter, ReservationListItem, ReservationStatus,
};
use gastro_service::AttendanceOutcome;
use http::StatusCode;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extract::{Body, CurrentTenant, Param, Params};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/reservations", get(list).post(create))
        .route("/reservations/counters", get(counters))
        .route("/reservations/weekly", get(weekly))
        .route("/reservations/{id}/status", put(set_status))
        .route("/reservations/{id}/attendance", post(attendance))
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(default)]
    filter: ReservationFilter,
    #[serde(default)]
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: ReservationStatus,
}

async fn list(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Params(params): Params<ListParams>,
) -> ApiResult<Json<Vec<ReservationListItem>>> {
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let rows = state
        .office
        .list_reservations(&tenant, params.filter, search)
        .await?;
    Ok(Json(rows))
}

async fn create(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Body(input): Body<NewReservationInput>,
) -> ApiResult<(StatusCode, Json<Reservation>)> {
    let reservation = state.office.create_reservation(&tenant, input).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

async fn set_status(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<ReservationId>,
    Body(body): Body<StatusBody>,
) -> ApiResult<Json<Reservation>> {
    let reservation = state
        .office
        .set_reservation_status(&tenant, id, body.status)
        .await?;
    Ok(Json(reservation))
}

async fn attendance(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Param(id): Param<ReservationId>,
    Body(input): Body<AttendanceInput>,
) -> ApiResult<Json<AttendanceOutcome>> {
    Ok(Json(state.office.mark_attendance(&tenant, id, input).await?))
}

async fn counters(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<ReservationCounters>> {
    Ok(Json(state.office.reservation_counters(&tenant).await?))
}

async fn weekly(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<Vec<DayCount>>> {
    Ok(Json(state.office.weekly_chart(&tenant).await?))
}
