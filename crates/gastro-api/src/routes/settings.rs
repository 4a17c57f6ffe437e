use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use gastro_core::restaurant::{Restaurant, SettingsInput};

use crate::error::ApiResult;
use crate::extract::{Body, CurrentTenant};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/settings", get(read).put(update))
}

async fn read(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<Restaurant>> {
    Ok(Json(state.office.get_settings(&tenant).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Body(input): Body<SettingsInput>,
) -> ApiResult<Json<Restaurant>> {
    Ok(Json(state.office.update_settings(&tenant, input).await?))
}
