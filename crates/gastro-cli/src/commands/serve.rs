//! `gastro serve`.

use std::sync::Arc;

use axum::Router;

use crate::commands::Runtime;
use crate::config::GastroConfig;
use crate::error::{Error, Result};
use gastro_api::{AppState, create_router, serve};
use gastro_auth::{HostedTokenValidator, StaticTokenValidator};

/// Builds the API from `config` and serves it until shutdown.
pub async fn run(config: &GastroConfig) -> Result<()> {
    let runtime = Runtime::open(config).await?;
    let router = build_router(config, &runtime)?;
    let addr = config.server.addr()?;

    tracing::info!(
        %addr,
        backend = runtime.office.store().name(),
        auth = config.auth.enabled,
        timezone = %runtime.office.timezone(),
        "Starting Gastro API"
    );
    serve(addr, router).await.map_err(Error::Server)
}

/// The router for `runtime`, with the validator `config` asks for.
pub fn build_router(config: &GastroConfig, runtime: &Runtime) -> Result<Router> {
    let cors = config.server.cors()?;
    let auth = config.auth.layer_config();
    let mut state = AppState::new(runtime.office.clone());

    if !config.auth.enabled {
        match config.auth.dev_user.or(runtime.demo.map(|d| d.user)) {
            Some(user) => {
                tracing::warn!(%user, "Authentication disabled; panel requests act as this user");
                state = state.with_dev_user(user);
            }
            None => tracing::warn!("Authentication disabled and no dev user; panel routes will answer 401"),
        }
        return Ok(create_router(
            state,
            Arc::new(StaticTokenValidator::new()),
            auth,
            cors,
        ));
    }

    let url = if config.auth.url.trim().is_empty() {
        config.backend.url.as_str()
    } else {
        config.auth.url.as_str()
    };
    if url.trim().is_empty() || config.auth.api_key.trim().is_empty() {
        return Err(Error::config(
            "auth.url (or backend.url) and auth.api_key are required when auth is enabled",
        ));
    }
    let validator = HostedTokenValidator::new(url, &config.auth.api_key)?;
    Ok(create_router(state, Arc::new(validator), auth, cors))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn status(router: Router, uri: &str) -> StatusCode {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_memory_mode_serves_demo_without_auth() {
        let config = GastroConfig::default();
        let runtime = Runtime::open(&config).await.unwrap();
        let router = build_router(&config, &runtime).unwrap();

        assert_eq!(status(router.clone(), "/health").await, StatusCode::OK);
        assert_eq!(status(router.clone(), "/api/dashboard").await, StatusCode::OK);
        assert_eq!(
            status(router, "/api/public/customers/demo").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_auth_requires_keys() {
        let mut config = GastroConfig::default();
        config.auth.enabled = true;
        let runtime = Runtime::open(&config).await.unwrap();
        assert!(matches!(
            build_router(&config, &runtime),
            Err(Error::Config(_))
        ));

        config.auth.url = "https://auth.example.com".into();
        config.auth.api_key = "anon".into();
        let router = build_router(&config, &runtime).unwrap();
        assert_eq!(status(router, "/api/dashboard").await, StatusCode::UNAUTHORIZED);
    }
}
