//! Store traits implemented over [`HostedClient`].

use super::{HostedClient, Query};
use crate::traits::{
    CouponStore, CustomerStore, LoyaltyStore, ReservationQuery, ReservationStore,
    RestaurantStore, ReviewStore, Store,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use gastro_core::customers::{Customer, NewCustomer, PROC_INCREMENT_VISIT, VisitRecord};
use gastro_core::loyalty::{
    PROC_CANCEL_REDEMPTION, PROC_CONFIRM_REDEMPTION, PROC_REDEEM, PROC_REGISTER_SPEND,
    Redemption, Reward, RewardDraft,
};
use gastro_core::promotions::{Coupon, CouponDraft};
use gastro_core::reservations::{NewReservation, Reservation, ReservationStatus};
use gastro_core::restaurant::{Restaurant, SettingsUpdate};
use gastro_core::reviews::{ReplyUpdate, Review};
use gastro_core::{
    CouponId, CustomerId, RedemptionId, ReservationId, RestaurantId, Result, ReviewId, RewardId,
    UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

const RESTAURANTS: &str = "restaurantes";
const MEMBERSHIPS: &str = "usuarios_restaurantes";
const RESERVATIONS: &str = "reservas";
const CUSTOMERS: &str = "clientes";
const HISTORY: &str = "clientes_historial";
const REVIEWS: &str = "resenas";
const REWARDS: &str = "premios_puntos";
const REDEMPTIONS: &str = "canjes_puntos";
const BALANCES: &str = "puntos_saldos";
const COUPONS: &str = "cupones";

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Deserialize)]
struct MembershipRow {
    restaurante_id: RestaurantId,
}

#[derive(Deserialize)]
struct EmailRow {
    cliente_id: CustomerId,
    email: Option<String>,
}

#[derive(Deserialize)]
struct BalanceRow {
    #[serde(default)]
    puntos: Option<f64>,
}

#[derive(Serialize)]
struct TenantRow<'a, T: Serialize> {
    restaurante_id: RestaurantId,
    #[serde(flatten)]
    fields: &'a T,
}

/// Hosted database backend.
#[derive(Debug, Clone)]
pub struct HostedStore {
    client: HostedClient,
}

impl HostedStore {
    /// Wraps a client.
    pub fn new(client: HostedClient) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &HostedClient {
        &self.client
    }

    fn tenant(table: &str, restaurant: RestaurantId) -> Query {
        Query::table(table).eq("restaurante_id", restaurant)
    }

    fn reservations(restaurant: RestaurantId, query: &ReservationQuery) -> Query {
        let mut q = Self::tenant(RESERVATIONS, restaurant);
        if let Some(from) = query.from {
            q = q.gte("fecha_hora_reserva", ts(from));
        }
        if let Some(to) = query.to {
            q = q.lte("fecha_hora_reserva", ts(to));
        }
        if let Some(status) = query.status {
            q = q.eq("estado", status);
        } else if query.exclude_cancelled {
            q = q.neq("estado", ReservationStatus::Cancelled);
        }
        q
    }
}

impl Store for HostedStore {
    fn name(&self) -> &str {
        "hosted"
    }
}

// ============================================================================
// Restaurants
// ============================================================================

#[async_trait]
impl RestaurantStore for HostedStore {
    async fn restaurant_for_user(&self, user: UserId) -> Result<Option<RestaurantId>> {
        let q = Query::table(MEMBERSHIPS)
            .select("restaurante_id")
            .eq("user_id", user);
        let row: Option<MembershipRow> = self.client.select_one(&q).await?;
        Ok(row.map(|r| r.restaurante_id))
    }

    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>> {
        self.client
            .select_one(&Query::table(RESTAURANTS).eq("id", id))
            .await
    }

    async fn update_settings(
        &self,
        id: RestaurantId,
        update: &SettingsUpdate,
    ) -> Result<Option<Restaurant>> {
        let rows: Vec<Restaurant> = self
            .client
            .update(&Query::table(RESTAURANTS).eq("id", id), update)
            .await?;
        Ok(rows.into_iter().next())
    }
}

// ============================================================================
// Reservations
// ============================================================================

#[async_trait]
impl ReservationStore for HostedStore {
    async fn list_reservations(
        &self,
        restaurant: RestaurantId,
        query: &ReservationQuery,
    ) -> Result<Vec<Reservation>> {
        let q = Self::reservations(restaurant, query);
        self.client
            .select(&q.order("fecha_hora_reserva", true))
            .await
    }

    async fn count_reservations(
        &self,
        restaurant: RestaurantId,
        query: &ReservationQuery,
    ) -> Result<usize> {
        self.client.count(&Self::reservations(restaurant, query)).await
    }

    async fn get_reservation(
        &self,
        restaurant: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>> {
        self.client
            .select_one(&Self::tenant(RESERVATIONS, restaurant).eq("id", id))
            .await
    }

    async fn insert_reservation(&self, reservation: &NewReservation) -> Result<Reservation> {
        self.client.insert(RESERVATIONS, reservation).await
    }

    async fn update_reservation_status(
        &self,
        restaurant: RestaurantId,
        id: ReservationId,
        status: ReservationStatus,
    ) -> Result<Option<Reservation>> {
        let rows: Vec<Reservation> = self
            .client
            .update(
                &Self::tenant(RESERVATIONS, restaurant).eq("id", id),
                &json!({ "estado": status }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn record_attendance(
        &self,
        restaurant: RestaurantId,
        id: ReservationId,
        attended: bool,
    ) -> Result<Option<Reservation>> {
        let q = Self::tenant(RESERVATIONS, restaurant)
            .eq("id", id)
            .is_null("atendida");
        let rows: Vec<Reservation> = self
            .client
            .update(&q, &json!({ "atendida": attended }))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn latest_emails(
        &self,
        restaurant: RestaurantId,
        customers: &[CustomerId],
    ) -> Result<HashMap<CustomerId, String>> {
        if customers.is_empty() {
            return Ok(HashMap::new());
        }
        let q = Self::tenant(RESERVATIONS, restaurant)
            .select("cliente_id,email,fecha_hora_reserva")
            .in_list("cliente_id", customers)
            .not_null("email")
            .order("cliente_id", true)
            .order("fecha_hora_reserva", false);
        let rows: Vec<EmailRow> = self.client.select(&q).await?;

        let mut emails = HashMap::new();
        for row in rows {
            if let Some(email) = row.email.filter(|e| !e.trim().is_empty()) {
                emails.entry(row.cliente_id).or_insert(email);
            }
        }
        Ok(emails)
    }
}

// ============================================================================
// Customers
// ============================================================================

#[async_trait]
impl CustomerStore for HostedStore {
    async fn list_customers(&self, restaurant: RestaurantId) -> Result<Vec<Customer>> {
        self.client
            .select(&Self::tenant(CUSTOMERS, restaurant).order_desc_nulls_last("ultima_visita"))
            .await
    }

    async fn count_customers_created(
        &self,
        restaurant: RestaurantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<usize> {
        let q = Self::tenant(CUSTOMERS, restaurant)
            .gte("created_at", ts(from))
            .lte("created_at", ts(to));
        self.client.count(&q).await
    }

    async fn get_customer(
        &self,
        restaurant: RestaurantId,
        id: CustomerId,
    ) -> Result<Option<Customer>> {
        self.client
            .select_one(&Self::tenant(CUSTOMERS, restaurant).eq("id", id))
            .await
    }

    async fn customers_by_ids(
        &self,
        restaurant: RestaurantId,
        ids: &[CustomerId],
    ) -> Result<Vec<Customer>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(&Self::tenant(CUSTOMERS, restaurant).in_list("id", ids))
            .await
    }

    async fn find_customer_by_phone(
        &self,
        restaurant: RestaurantId,
        phone: &str,
    ) -> Result<Option<Customer>> {
        self.client
            .select_one(&Self::tenant(CUSTOMERS, restaurant).eq("telefono", phone))
            .await
    }

    async fn find_customer_by_name(
        &self,
        restaurant: RestaurantId,
        normalized: &str,
    ) -> Result<Option<Customer>> {
        self.client
            .select_one(&Self::tenant(CUSTOMERS, restaurant).eq("nombre_normalizado", normalized))
            .await
    }

    async fn find_customer_by_token(&self, token: &str) -> Result<Option<Customer>> {
        self.client
            .select_one(&Query::table(CUSTOMERS).eq("public_token", token))
            .await
    }

    async fn insert_customer(&self, customer: &NewCustomer) -> Result<Customer> {
        self.client.insert(CUSTOMERS, customer).await
    }

    async fn increment_visit(&self, customer: CustomerId) -> Result<()> {
        self.client
            .rpc(PROC_INCREMENT_VISIT, &json!({ "cliente_id_input": customer }))
            .await?;
        Ok(())
    }

    async fn append_visit(&self, visit: &VisitRecord) -> Result<()> {
        let _: serde_json::Value = self.client.insert(HISTORY, visit).await?;
        Ok(())
    }

    async fn upsert_reservation_visit(&self, visit: &VisitRecord) -> Result<()> {
        self.client.upsert(HISTORY, visit, "reserva_id").await
    }

    async fn list_visits(
        &self,
        restaurant: RestaurantId,
        customer: CustomerId,
    ) -> Result<Vec<VisitRecord>> {
        let q = Self::tenant(HISTORY, restaurant)
            .eq("cliente_id", customer)
            .order("created_at", false);
        self.client.select(&q).await
    }
}

// ============================================================================
// Reviews
// ============================================================================

#[async_trait]
impl ReviewStore for HostedStore {
    async fn list_reviews(&self, restaurant: RestaurantId) -> Result<Vec<Review>> {
        self.client
            .select(&Self::tenant(REVIEWS, restaurant).order("fecha_reseña", false))
            .await
    }

    async fn save_reply(
        &self,
        restaurant: RestaurantId,
        id: ReviewId,
        reply: &ReplyUpdate,
    ) -> Result<Option<Review>> {
        let rows: Vec<Review> = self
            .client
            .update(&Self::tenant(REVIEWS, restaurant).eq("id", id), reply)
            .await?;
        Ok(rows.into_iter().next())
    }
}

// ============================================================================
// Loyalty
// ============================================================================

#[async_trait]
impl LoyaltyStore for HostedStore {
    async fn balance(&self, restaurant: RestaurantId, customer: CustomerId) -> Result<i64> {
        let q = Self::tenant(BALANCES, restaurant)
            .select("puntos")
            .eq("cliente_id", customer);
        let row: Option<BalanceRow> = self.client.select_one(&q).await?;
        Ok(row.and_then(|r| r.puntos).unwrap_or(0.0) as i64)
    }

    async fn list_rewards(
        &self,
        restaurant: RestaurantId,
        active_only: bool,
    ) -> Result<Vec<Reward>> {
        let mut q = Self::tenant(REWARDS, restaurant);
        if active_only {
            q = q.eq("activo", true);
        }
        self.client.select(&q.order("puntos_requeridos", true)).await
    }

    async fn rewards_by_ids(
        &self,
        restaurant: RestaurantId,
        ids: &[RewardId],
    ) -> Result<Vec<Reward>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .select(&Self::tenant(REWARDS, restaurant).in_list("id", ids))
            .await
    }

    async fn insert_reward(&self, restaurant: RestaurantId, draft: &RewardDraft) -> Result<Reward> {
        #[derive(Serialize)]
        struct Row<'a> {
            #[serde(flatten)]
            tenant: TenantRow<'a, RewardDraft>,
            activo: bool,
        }
        let row = Row {
            tenant: TenantRow {
                restaurante_id: restaurant,
                fields: draft,
            },
            activo: true,
        };
        self.client.insert(REWARDS, &row).await
    }

    async fn update_reward(
        &self,
        restaurant: RestaurantId,
        id: RewardId,
        draft: &RewardDraft,
    ) -> Result<Option<Reward>> {
        let rows: Vec<Reward> = self
            .client
            .update(&Self::tenant(REWARDS, restaurant).eq("id", id), draft)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn set_reward_active(
        &self,
        restaurant: RestaurantId,
        id: RewardId,
        active: bool,
    ) -> Result<Option<Reward>> {
        let rows: Vec<Reward> = self
            .client
            .update(
                &Self::tenant(REWARDS, restaurant).eq("id", id),
                &json!({ "activo": active }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_reward(&self, restaurant: RestaurantId, id: RewardId) -> Result<bool> {
        let n = self
            .client
            .delete(&Self::tenant(REWARDS, restaurant).eq("id", id))
            .await?;
        Ok(n > 0)
    }

    async fn list_redemptions(
        &self,
        restaurant: RestaurantId,
        customer: Option<CustomerId>,
    ) -> Result<Vec<Redemption>> {
        let mut q = Self::tenant(REDEMPTIONS, restaurant);
        if let Some(customer) = customer {
            q = q.eq("cliente_id", customer);
        }
        self.client.select(&q.order("creado_en", false)).await
    }

    async fn register_spend(
        &self,
        restaurant: RestaurantId,
        customer: CustomerId,
        amount: f64,
    ) -> Result<i64> {
        let before = self.balance(restaurant, customer).await?;
        let credited = self
            .client
            .rpc(
                PROC_REGISTER_SPEND,
                &json!({
                    "p_cliente_id": customer,
                    "p_restaurante_id": restaurant,
                    "p_gasto": amount,
                }),
            )
            .await?;
        // The procedure may return the credited points; otherwise diff the view.
        if let Some(points) = credited.as_i64() {
            return Ok(points.max(0));
        }
        let after = self.balance(restaurant, customer).await?;
        Ok((after - before).max(0))
    }

    async fn redeem(
        &self,
        restaurant: RestaurantId,
        customer: CustomerId,
        reward: RewardId,
    ) -> Result<()> {
        self.client
            .rpc(
                PROC_REDEEM,
                &json!({
                    "p_cliente_id": customer,
                    "p_restaurante_id": restaurant,
                    "p_premio_id": reward,
                }),
            )
            .await?;
        Ok(())
    }

    async fn confirm_redemption(&self, restaurant: RestaurantId, id: RedemptionId) -> Result<()> {
        self.client
            .rpc(
                PROC_CONFIRM_REDEMPTION,
                &json!({ "p_canje_id": id, "p_restaurante_id": restaurant }),
            )
            .await?;
        Ok(())
    }

    async fn cancel_redemption(&self, restaurant: RestaurantId, id: RedemptionId) -> Result<()> {
        self.client
            .rpc(
                PROC_CANCEL_REDEMPTION,
                &json!({ "p_canje_id": id, "p_restaurante_id": restaurant }),
            )
            .await?;
        Ok(())
    }
}

// ============================================================================
// Coupons
// ============================================================================

#[async_trait]
impl CouponStore for HostedStore {
    async fn list_coupons(
        &self,
        restaurant: RestaurantId,
        active_only: bool,
    ) -> Result<Vec<Coupon>> {
        let mut q = Self::tenant(COUPONS, restaurant);
        if active_only {
            q = q.eq("activo", true);
        }
        self.client.select(&q.order("creado_en", false)).await
    }

    async fn insert_coupon(&self, restaurant: RestaurantId, draft: &CouponDraft) -> Result<Coupon> {
        let row = TenantRow {
            restaurante_id: restaurant,
            fields: draft,
        };
        self.client.insert(COUPONS, &row).await
    }

    async fn update_coupon(
        &self,
        restaurant: RestaurantId,
        id: CouponId,
        draft: &CouponDraft,
    ) -> Result<Option<Coupon>> {
        let rows: Vec<Coupon> = self
            .client
            .update(&Self::tenant(COUPONS, restaurant).eq("id", id), draft)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn set_coupon_active(
        &self,
        restaurant: RestaurantId,
        id: CouponId,
        active: bool,
    ) -> Result<Option<Coupon>> {
        let rows: Vec<Coupon> = self
            .client
            .update(
                &Self::tenant(COUPONS, restaurant).eq("id", id),
                &json!({ "activo": active }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_coupon(&self, restaurant: RestaurantId, id: CouponId) -> Result<bool> {
        let n = self
            .client
            .delete(&Self::tenant(COUPONS, restaurant).eq("id", id))
            .await?;
        Ok(n > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hosted::HostedConfig;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store(server: &MockServer) -> HostedStore {
        HostedStore::new(
            HostedClient::new(HostedConfig {
                url: server.uri(),
                api_key: "k".into(),
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_restaurant_for_user() {
        let server = MockServer::start().await;
        let user = UserId::new();
        let rid = RestaurantId::new();
        Mock::given(method("GET"))
            .and(path("/rest/v1/usuarios_restaurantes"))
            .and(query_param("user_id", format!("eq.{user}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "restaurante_id": rid }])),
            )
            .mount(&server)
            .await;
        let found = store(&server).await.restaurant_for_user(user).await.unwrap();
        assert_eq!(found, Some(rid));
    }

    #[tokio::test]
    async fn test_attendance_update_is_conditional() {
        let server = MockServer::start().await;
        let rid = RestaurantId::new();
        let id = ReservationId::new();
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/reservas"))
            .and(query_param("atendida", "is.null"))
            .and(query_param("id", format!("eq.{id}")))
            .and(query_param("restaurante_id", format!("eq.{rid}")))
            .and(body_json(json!({ "atendida": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        let updated = store(&server)
            .await
            .record_attendance(rid, id, true)
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_latest_emails_keeps_first_per_customer() {
        let server = MockServer::start().await;
        let rid = RestaurantId::new();
        let a = CustomerId::new();
        let b = CustomerId::new();
        Mock::given(method("GET"))
            .and(path("/rest/v1/reservas"))
            .and(query_param("email", "not.is.null"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "cliente_id": a, "email": "new@a.es", "fecha_hora_reserva": "2026-10-10T20:00:00Z" },
                { "cliente_id": a, "email": "old@a.es", "fecha_hora_reserva": "2026-01-10T20:00:00Z" },
                { "cliente_id": b, "email": "", "fecha_hora_reserva": "2026-10-10T20:00:00Z" }
            ])))
            .mount(&server)
            .await;
        let emails = store(&server)
            .await
            .latest_emails(rid, &[a, b])
            .await
            .unwrap();
        assert_eq!(emails.get(&a).map(String::as_str), Some("new@a.es"));
        assert!(!emails.contains_key(&b));
    }

    #[tokio::test]
    async fn test_count_reservations_uses_exact_count() {
        let server = MockServer::start().await;
        let rid = RestaurantId::new();
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/reservas"))
            .and(query_param("restaurante_id", format!("eq.{rid}")))
            .and(query_param("estado", "eq.pendiente"))
            .and(header("Prefer", "count=exact"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Range", "*/3"))
            .expect(1)
            .mount(&server)
            .await;
        let n = store(&server)
            .await
            .count_reservations(
                rid,
                &ReservationQuery::all().with_status(ReservationStatus::Pending),
            )
            .await
            .unwrap();
        assert_eq!(n, 3);
    }

    #[tokio::test]
    async fn test_balance_defaults_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/puntos_saldos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        let balance = store(&server)
            .await
            .balance(RestaurantId::new(), CustomerId::new())
            .await
            .unwrap();
        assert_eq!(balance, 0);
    }

    #[tokio::test]
    async fn test_register_spend_reports_balance_change() {
        let server = MockServer::start().await;
        let rid = RestaurantId::new();
        let cid = CustomerId::new();
        Mock::given(method("GET"))
            .and(path("/rest/v1/puntos_saldos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "puntos": 10 }])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/rpc_registrar_gasto"))
            .and(body_json(json!({
                "p_cliente_id": cid,
                "p_restaurante_id": rid,
                "p_gasto": 42.5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/puntos_saldos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "puntos": 52 }])))
            .mount(&server)
            .await;
        let credited = store(&server)
            .await
            .register_spend(rid, cid, 42.5)
            .await
            .unwrap();
        assert_eq!(credited, 42);
    }

    #[tokio::test]
    async fn test_register_spend_prefers_procedure_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/puntos_saldos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/rpc_registrar_gasto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(0)))
            .mount(&server)
            .await;
        let credited = store(&server)
            .await
            .register_spend(RestaurantId::new(), CustomerId::new(), 20.0)
            .await
            .unwrap();
        assert_eq!(credited, 0);
    }

    #[tokio::test]
    async fn test_insert_reward_carries_tenant_and_active_flag() {
        let server = MockServer::start().await;
        let rid = RestaurantId::new();
        let reward_id = RewardId::new();
        Mock::given(method("POST"))
            .and(path("/rest/v1/premios_puntos"))
            .and(body_json(json!({
                "restaurante_id": rid,
                "nombre": "Postre",
                "descripcion": null,
                "puntos_requeridos": 50,
                "imagen_url": null,
                "activo": true
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": reward_id,
                "restaurante_id": rid,
                "nombre": "Postre",
                "puntos_requeridos": 50,
                "activo": true
            }])))
            .mount(&server)
            .await;
        let draft = RewardDraft {
            nombre: "Postre".into(),
            descripcion: None,
            puntos_requeridos: 50,
            imagen_url: None,
        };
        let reward = store(&server).await.insert_reward(rid, &draft).await.unwrap();
        assert_eq!(reward.id, reward_id);
        assert!(reward.activo);
    }
}
