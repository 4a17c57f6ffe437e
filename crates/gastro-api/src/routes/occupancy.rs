use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use gastro_core::occupancy::{DayLoad, DayOccupancy, Headline};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extract::{CurrentTenant, Params};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/occupancy", get(day))
        .route("/occupancy/week", get(week))
        .route("/occupancy/slack-day", get(slack_day))
        .route("/occupancy/headline", get(headline))
}

#[derive(Debug, Default, Deserialize)]
struct DayParams {
    #[serde(default)]
    date: Option<NaiveDate>,
}

/// Occupancy of `?date=` (local), today when omitted.
async fn day(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Params(params): Params<DayParams>,
) -> ApiResult<Json<DayOccupancy>> {
    let occupancy = match params.date {
        Some(date) => state.office.occupancy_on(&tenant, date).await?,
        None => state.office.occupancy_today(&tenant).await?,
    };
    Ok(Json(occupancy))
}

async fn week(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<Vec<DayLoad>>> {
    Ok(Json(state.office.week_load(&tenant).await?))
}

/// The emptiest remaining day, or `null`.
async fn slack_day(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<Option<DayLoad>>> {
    Ok(Json(state.office.slack_day(&tenant).await?))
}

async fn headline(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<Headline>> {
    Ok(Json(state.office.headline(&tenant).await?))
}
