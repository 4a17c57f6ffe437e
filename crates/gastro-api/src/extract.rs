//! Request extractors.
//!
//! The wrappers around axum's `Json`, `Path` and `Query` only change the
//! rejection, so malformed requests get the same JSON error body as failed
//! operations.

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::Json;
use gastro_auth::user_from_parts;
use gastro_service::Tenant;
use http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller's restaurant.
///
/// Taken from the authenticated user; when authentication is disabled the
/// configured development user stands in.
#[derive(Debug, Clone, Copy)]
pub struct CurrentTenant(pub Tenant);

impl FromRequestParts<AppState> for CurrentTenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = match user_from_parts(parts) {
            Some(user) => user.user_id,
            None => state.dev_user.ok_or(ApiError::Unauthenticated)?,
        };
        let tenant = state.office.resolve_tenant(user).await?;
        Ok(CurrentTenant(tenant))
    }
}

/// JSON request body.
#[derive(Debug, Clone)]
pub struct Body<T>(pub T);

impl<S, T> FromRequest<S> for Body<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Body(value))
    }
}

/// Path parameters.
#[derive(Debug, Clone)]
pub struct Param<T>(pub T);

impl<S, T> FromRequestParts<S> for Param<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Param(value))
    }
}

/// Query-string parameters.
#[derive(Debug, Clone)]
pub struct Params<T>(pub T);

impl<S, T> FromRequestParts<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Params(value))
    }
}
