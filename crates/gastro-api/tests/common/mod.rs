//! Shared harness for the API integration tests.

#![allow(clippy::unwrap_used, dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::{DateTime, TimeZone, Utc};
use gastro_api::{AppState, create_router};
use gastro_auth::{AuthConfig, AuthenticatedUser, StaticTokenValidator};
use gastro_core::customers::Customer;
use gastro_core::restaurant::Restaurant;
use gastro_core::{CustomerId, RestaurantId, UserId};
use gastro_service::{BackOffice, FixedClock, ServiceConfig};
use gastro_store::MemoryStore;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

pub const STAFF_TOKEN: &str = "staff-token";
pub const OTHER_TOKEN: &str = "other-token";
pub const STRANGER_TOKEN: &str = "stranger-token";

/// Friday 2026-10-16, 12:00 in Madrid.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub office: Arc<BackOffice>,
    pub restaurant: RestaurantId,
    pub other_restaurant: RestaurantId,
}

fn restaurant(id: RestaurantId, name: &str) -> Restaurant {
    let mut r = Restaurant::new(id, name);
    r.lunch_schedule = Some("13:00-16:00".into());
    r.dinner_schedule = Some("20:00-23:00".into());
    r.lunch_capacity = Some(50);
    r.dinner_capacity = Some(50);
    r.points_enabled = Some(true);
    r.points_per_euro = Some(1.0);
    r
}

fn staff(user: UserId, email: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: user,
        email: email.to_string(),
    }
}

impl TestApp {
    /// Two restaurants with one staff member each, plus a signed-in user
    /// without a restaurant. Auth is enabled.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());

        let restaurant_id = RestaurantId::new();
        let other_id = RestaurantId::new();
        store.add_restaurant(restaurant(restaurant_id, "Casa Pepe"));
        store.add_restaurant(restaurant(other_id, "Bar Manolo"));

        let user = UserId::new();
        let other_user = UserId::new();
        store.add_member(user, restaurant_id);
        store.add_member(other_user, other_id);

        let validator = StaticTokenValidator::new()
            .with_token(STAFF_TOKEN, staff(user, "ana@casapepe.es"))
            .with_token(OTHER_TOKEN, staff(other_user, "manolo@barmanolo.es"))
            .with_token(STRANGER_TOKEN, staff(UserId::new(), "nobody@example.com"));

        let office = Arc::new(
            BackOffice::new(store.clone(), &ServiceConfig::default())
                .unwrap()
                .with_clock(Arc::new(FixedClock::new(start()))),
        );
        let auth = AuthConfig {
            enabled: true,
            domain: String::new(),
        };
        let router = create_router(
            AppState::new(office.clone()),
            Arc::new(validator),
            auth,
            CorsLayer::permissive(),
        );

        Self {
            router,
            store,
            office,
            restaurant: restaurant_id,
            other_restaurant: other_id,
        }
    }

    /// Seeds a customer with a rewards-page token and a points balance.
    pub fn customer_with_points(&self, name: &str, token: &str, points: i64) -> CustomerId {
        let id = CustomerId::new();
        self.store.add_customer(Customer {
            id,
            restaurante_id: self.restaurant,
            nombre: Some(name.to_string()),
            nombre_normalizado: Some(gastro_core::customers::normalize_name(name)),
            telefono: Some("600111222".into()),
            visitas_totales: 1,
            ultima_visita: None,
            canal_contacto: Some("panel".into()),
            fecha_nacimiento: None,
            public_token: Some(token.to_string()),
            ya_dejo_resena: false,
            created_at: Some(start()),
        });
        self.store.adjust_points(self.restaurant, id, points);
        id
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        (status, json_response(response).await)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request("GET", uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request("POST", uri, token, Some(body))).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request("PUT", uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request("DELETE", uri, token, None)).await
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Parses a JSON body; empty bodies become `null`.
pub async fn json_response(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
