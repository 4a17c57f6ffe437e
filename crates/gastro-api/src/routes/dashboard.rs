use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use gastro_service::{Dashboard, Tenant};

use crate::error::ApiResult;
use crate::extract::CurrentTenant;
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/dashboard", get(dashboard))
}

/// The caller's user and restaurant ids.
async fn me(CurrentTenant(tenant): CurrentTenant) -> Json<Tenant> {
    Json(tenant)
}

async fn dashboard(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.office.dashboard(&tenant).await?))
}
