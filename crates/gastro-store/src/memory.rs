//! In-memory backend.
//!
//! Holds every table in a single mutex-protected state and re-implements the
//! hosted stored procedures, including the points ledger behind the
//! `puntos_saldos` view. Locks are never held across an await point.

use crate::traits::{
    CouponStore, CustomerStore, LoyaltyStore, ReservationQuery, ReservationStore,
    RestaurantStore, ReviewStore, Store,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gastro_core::customers::{Customer, NewCustomer, PROC_INCREMENT_VISIT, VisitRecord};
use gastro_core::loyalty::{
    PROC_CANCEL_REDEMPTION, PROC_CONFIRM_REDEMPTION, PROC_REDEEM, PROC_REGISTER_SPEND,
    Redemption, RedemptionStatus, Reward, RewardDraft, points_for_spend,
};
use gastro_core::promotions::{Coupon, CouponDraft};
use gastro_core::reservations::{NewReservation, Reservation, ReservationStatus};
use gastro_core::restaurant::{Restaurant, SettingsUpdate};
use gastro_core::reviews::{ReplyUpdate, Review};
use gastro_core::{
    CouponId, CustomerId, Error, RedemptionId, ReservationId, RestaurantId, Result, ReviewId,
    RewardId, UserId,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    restaurant: RestaurantId,
    customer: CustomerId,
    points: i64,
}

#[derive(Debug, Default)]
struct State {
    restaurants: HashMap<RestaurantId, Restaurant>,
    members: HashMap<UserId, RestaurantId>,
    reservations: Vec<Reservation>,
    customers: Vec<Customer>,
    history: Vec<VisitRecord>,
    reviews: Vec<Review>,
    rewards: Vec<Reward>,
    redemptions: Vec<Redemption>,
    ledger: Vec<LedgerEntry>,
    coupons: Vec<Coupon>,
}

impl State {
    fn balance(&self, restaurant: RestaurantId, customer: CustomerId) -> i64 {
        self.ledger
            .iter()
            .filter(|e| e.restaurant == restaurant && e.customer == customer)
            .map(|e| e.points)
            .sum()
    }
}

/// In-process backend for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ------------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------------

    /// Adds or replaces a restaurant.
    pub fn add_restaurant(&self, restaurant: Restaurant) {
        self.lock().restaurants.insert(restaurant.id, restaurant);
    }

    /// Grants a user access to a restaurant.
    pub fn add_member(&self, user: UserId, restaurant: RestaurantId) {
        self.lock().members.insert(user, restaurant);
    }

    /// Adds a reservation row as is.
    pub fn add_reservation(&self, reservation: Reservation) {
        self.lock().reservations.push(reservation);
    }

    /// Adds a customer row as is.
    pub fn add_customer(&self, customer: Customer) {
        self.lock().customers.push(customer);
    }

    /// Applies `edit` to a stored customer. Returns whether it exists.
    pub fn edit_customer(&self, id: CustomerId, edit: impl FnOnce(&mut Customer)) -> bool {
        let mut state = self.lock();
        match state.customers.iter_mut().find(|c| c.id == id) {
            Some(c) => {
                edit(c);
                true
            }
            None => false,
        }
    }

    /// Adds a review row as is.
    pub fn add_review(&self, review: Review) {
        self.lock().reviews.push(review);
    }

    /// Writes a ledger movement directly.
    pub fn adjust_points(&self, restaurant: RestaurantId, customer: CustomerId, points: i64) {
        self.lock().ledger.push(LedgerEntry {
            restaurant,
            customer,
            points,
        });
    }
}

impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// Restaurants
// ============================================================================

#[async_trait]
impl RestaurantStore for MemoryStore {
    async fn restaurant_for_user(&self, user: UserId) -> Result<Option<RestaurantId>> {
        Ok(self.lock().members.get(&user).copied())
    }

    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>> {
        Ok(self.lock().restaurants.get(&id).cloned())
    }

    async fn update_settings(
        &self,
        id: RestaurantId,
        update: &SettingsUpdate,
    ) -> Result<Option<Restaurant>> {
        let mut state = self.lock();
        let Some(r) = state.restaurants.get_mut(&id) else {
            return Ok(None);
        };
        r.name = Some(update.name.clone());
        r.phone = Some(update.phone.clone());
        r.total_capacity = Some(update.total_capacity);
        r.lunch_schedule = Some(update.lunch_schedule.clone());
        r.dinner_schedule = Some(update.dinner_schedule.clone());
        r.lunch_capacity = Some(update.lunch_capacity);
        r.dinner_capacity = Some(update.dinner_capacity);
        r.points_enabled = Some(update.points_enabled);
        r.points_per_euro = Some(update.points_per_euro);
        Ok(Some(r.clone()))
    }
}

// ============================================================================
// Reservations
// ============================================================================

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn list_reservations(
        &self,
        restaurant: RestaurantId,
        query: &ReservationQuery,
    ) -> Result<Vec<Reservation>> {
        let mut rows: Vec<Reservation> = self
            .lock()
            .reservations
            .iter()
            .filter(|r| r.restaurante_id == restaurant && query.matches(r))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.fecha_hora_reserva);
        Ok(rows)
    }

    async fn count_reservations(
        &self,
        restaurant: RestaurantId,
        query: &ReservationQuery,
    ) -> Result<usize> {
        Ok(self
            .lock()
            .reservations
            .iter()
            .filter(|r| r.restaurante_id == restaurant && query.matches(r))
            .count())
    }

    async fn get_reservation(
        &self,
        restaurant: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>> {
        Ok(self
            .lock()
            .reservations
            .iter()
            .find(|r| r.id == id && r.restaurante_id == restaurant)
            .cloned())
    }

    async fn insert_reservation(&self, new: &NewReservation) -> Result<Reservation> {
        let row = Reservation {
            id: ReservationId::new(),
            restaurante_id: new.restaurante_id,
            cliente_id: Some(new.cliente_id),
            nombre_cliente: Some(new.nombre_cliente.clone()),
            telefono: Some(new.telefono.clone()),
            email: new.email.clone(),
            personas: Some(new.personas),
            fecha_hora_reserva: new.fecha_hora_reserva,
            estado: new.estado,
            atendida: None,
            resena_solicitada: false,
            origen: Some(new.origen.clone()),
        };
        self.lock().reservations.push(row.clone());
        Ok(row)
    }

    async fn update_reservation_status(
        &self,
        restaurant: RestaurantId,
        id: ReservationId,
        status: ReservationStatus,
    ) -> Result<Option<Reservation>> {
        let mut state = self.lock();
        let found = state
            .reservations
            .iter_mut()
            .find(|r| r.id == id && r.restaurante_id == restaurant);
        Ok(found.map(|r| {
            r.estado = status;
            r.clone()
        }))
    }

    async fn record_attendance(
        &self,
        restaurant: RestaurantId,
        id: ReservationId,
        attended: bool,
    ) -> Result<Option<Reservation>> {
        let mut state = self.lock();
        let found = state
            .reservations
            .iter_mut()
            .find(|r| r.id == id && r.restaurante_id == restaurant && r.atendida.is_none());
        Ok(found.map(|r| {
            r.atendida = Some(attended);
            r.clone()
        }))
    }

    async fn latest_emails(
        &self,
        restaurant: RestaurantId,
        customers: &[CustomerId],
    ) -> Result<HashMap<CustomerId, String>> {
        let state = self.lock();
        let mut rows: Vec<&Reservation> = state
            .reservations
            .iter()
            .filter(|r| r.restaurante_id == restaurant)
            .filter(|r| r.cliente_id.is_some_and(|c| customers.contains(&c)))
            .collect();
        rows.sort_by(|a, b| b.fecha_hora_reserva.cmp(&a.fecha_hora_reserva));

        let mut emails = HashMap::new();
        for r in rows {
            if let (Some(customer), Some(email)) = (r.cliente_id, r.email.as_ref())
                && !email.trim().is_empty()
            {
                emails.entry(customer).or_insert_with(|| email.clone());
            }
        }
        Ok(emails)
    }
}

// ============================================================================
// Customers
// ============================================================================

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn list_customers(&self, restaurant: RestaurantId) -> Result<Vec<Customer>> {
        let mut rows: Vec<Customer> = self
            .lock()
            .customers
            .iter()
            .filter(|c| c.restaurante_id == restaurant)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.ultima_visita.cmp(&a.ultima_visita));
        Ok(rows)
    }

    async fn count_customers_created(
        &self,
        restaurant: RestaurantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<usize> {
        Ok(self
            .lock()
            .customers
            .iter()
            .filter(|c| c.restaurante_id == restaurant)
            .filter_map(|c| c.created_at)
            .filter(|at| *at >= from && *at <= to)
            .count())
    }

    async fn get_customer(
        &self,
        restaurant: RestaurantId,
        id: CustomerId,
    ) -> Result<Option<Customer>> {
        Ok(self
            .lock()
            .customers
            .iter()
            .find(|c| c.id == id && c.restaurante_id == restaurant)
            .cloned())
    }

    async fn customers_by_ids(
        &self,
        restaurant: RestaurantId,
        ids: &[CustomerId],
    ) -> Result<Vec<Customer>> {
        Ok(self
            .lock()
            .customers
            .iter()
            .filter(|c| c.restaurante_id == restaurant && ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn find_customer_by_phone(
        &self,
        restaurant: RestaurantId,
        phone: &str,
    ) -> Result<Option<Customer>> {
        Ok(self
            .lock()
            .customers
            .iter()
            .find(|c| c.restaurante_id == restaurant && c.telefono.as_deref() == Some(phone))
            .cloned())
    }

    async fn find_customer_by_name(
        &self,
        restaurant: RestaurantId,
        normalized: &str,
    ) -> Result<Option<Customer>> {
        Ok(self
            .lock()
            .customers
            .iter()
            .find(|c| {
                c.restaurante_id == restaurant && c.nombre_normalizado.as_deref() == Some(normalized)
            })
            .cloned())
    }

    async fn find_customer_by_token(&self, token: &str) -> Result<Option<Customer>> {
        Ok(self
            .lock()
            .customers
            .iter()
            .find(|c| c.public_token.as_deref() == Some(token))
            .cloned())
    }

    async fn insert_customer(&self, new: &NewCustomer) -> Result<Customer> {
        let row = Customer {
            id: CustomerId::new(),
            restaurante_id: new.restaurante_id,
            nombre: Some(new.nombre.clone()),
            nombre_normalizado: Some(new.nombre_normalizado.clone()),
            telefono: new.telefono.clone(),
            visitas_totales: new.visitas_totales,
            ultima_visita: new.ultima_visita,
            canal_contacto: new.canal_contacto.clone(),
            fecha_nacimiento: None,
            public_token: Some(uuid::Uuid::new_v4().simple().to_string()),
            ya_dejo_resena: false,
            created_at: Some(Utc::now()),
        };
        self.lock().customers.push(row.clone());
        Ok(row)
    }

    async fn increment_visit(&self, customer: CustomerId) -> Result<()> {
        let mut state = self.lock();
        let c = state
            .customers
            .iter_mut()
            .find(|c| c.id == customer)
            .ok_or_else(|| Error::procedure(PROC_INCREMENT_VISIT, "Cliente no encontrado"))?;
        c.visitas_totales += 1;
        c.ultima_visita = Some(Utc::now());
        Ok(())
    }

    async fn append_visit(&self, visit: &VisitRecord) -> Result<()> {
        self.lock().history.push(visit.clone());
        Ok(())
    }

    async fn upsert_reservation_visit(&self, visit: &VisitRecord) -> Result<()> {
        let mut state = self.lock();
        let existing = visit.reserva_id.and_then(|rid| {
            state
                .history
                .iter()
                .position(|h| h.reserva_id == Some(rid))
        });
        match existing {
            Some(i) => state.history[i] = visit.clone(),
            None => state.history.push(visit.clone()),
        }
        Ok(())
    }

    async fn list_visits(
        &self,
        restaurant: RestaurantId,
        customer: CustomerId,
    ) -> Result<Vec<VisitRecord>> {
        let mut rows: Vec<VisitRecord> = self
            .lock()
            .history
            .iter()
            .filter(|h| h.restaurante_id == restaurant && h.cliente_id == customer)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

// ============================================================================
// Reviews
// ============================================================================

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn list_reviews(&self, restaurant: RestaurantId) -> Result<Vec<Review>> {
        let mut rows: Vec<Review> = self
            .lock()
            .reviews
            .iter()
            .filter(|r| r.restaurante_id == restaurant)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.fecha_resena.cmp(&a.fecha_resena));
        Ok(rows)
    }

    async fn save_reply(
        &self,
        restaurant: RestaurantId,
        id: ReviewId,
        reply: &ReplyUpdate,
    ) -> Result<Option<Review>> {
        let mut state = self.lock();
        let found = state
            .reviews
            .iter_mut()
            .find(|r| r.id == id && r.restaurante_id == restaurant);
        Ok(found.map(|r| {
            r.respuesta_texto = Some(reply.respuesta_texto.clone());
            r.responded = reply.responded;
            r.clone()
        }))
    }
}

// ============================================================================
// Loyalty
// ============================================================================

#[async_trait]
impl LoyaltyStore for MemoryStore {
    async fn balance(&self, restaurant: RestaurantId, customer: CustomerId) -> Result<i64> {
        Ok(self.lock().balance(restaurant, customer))
    }

    async fn list_rewards(
        &self,
        restaurant: RestaurantId,
        active_only: bool,
    ) -> Result<Vec<Reward>> {
        let mut rows: Vec<Reward> = self
            .lock()
            .rewards
            .iter()
            .filter(|r| r.restaurante_id == restaurant && (!active_only || r.activo))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.puntos_requeridos);
        Ok(rows)
    }

    async fn rewards_by_ids(
        &self,
        restaurant: RestaurantId,
        ids: &[RewardId],
    ) -> Result<Vec<Reward>> {
        Ok(self
            .lock()
            .rewards
            .iter()
            .filter(|r| r.restaurante_id == restaurant && ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn insert_reward(&self, restaurant: RestaurantId, draft: &RewardDraft) -> Result<Reward> {
        let row = Reward {
            id: RewardId::new(),
            restaurante_id: restaurant,
            nombre: draft.nombre.clone(),
            descripcion: draft.descripcion.clone(),
            puntos_requeridos: draft.puntos_requeridos,
            imagen_url: draft.imagen_url.clone(),
            activo: true,
            creado_en: Some(Utc::now()),
        };
        self.lock().rewards.push(row.clone());
        Ok(row)
    }

    async fn update_reward(
        &self,
        restaurant: RestaurantId,
        id: RewardId,
        draft: &RewardDraft,
    ) -> Result<Option<Reward>> {
        let mut state = self.lock();
        let found = state
            .rewards
            .iter_mut()
            .find(|r| r.id == id && r.restaurante_id == restaurant);
        Ok(found.map(|r| {
            r.nombre = draft.nombre.clone();
            r.descripcion = draft.descripcion.clone();
            r.puntos_requeridos = draft.puntos_requeridos;
            r.imagen_url = draft.imagen_url.clone();
            r.clone()
        }))
    }

    async fn set_reward_active(
        &self,
        restaurant: RestaurantId,
        id: RewardId,
        active: bool,
    ) -> Result<Option<Reward>> {
        let mut state = self.lock();
        let found = state
            .rewards
            .iter_mut()
            .find(|r| r.id == id && r.restaurante_id == restaurant);
        Ok(found.map(|r| {
            r.activo = active;
            r.clone()
        }))
    }

    async fn delete_reward(&self, restaurant: RestaurantId, id: RewardId) -> Result<bool> {
        let mut state = self.lock();
        let before = state.rewards.len();
        state
            .rewards
            .retain(|r| !(r.id == id && r.restaurante_id == restaurant));
        Ok(state.rewards.len() < before)
    }

    async fn list_redemptions(
        &self,
        restaurant: RestaurantId,
        customer: Option<CustomerId>,
    ) -> Result<Vec<Redemption>> {
        let mut rows: Vec<Redemption> = self
            .lock()
            .redemptions
            .iter()
            .filter(|r| r.restaurante_id == restaurant)
            .filter(|r| customer.is_none_or(|c| r.cliente_id == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.creado_en.cmp(&a.creado_en));
        Ok(rows)
    }

    async fn register_spend(
        &self,
        restaurant: RestaurantId,
        customer: CustomerId,
        amount: f64,
    ) -> Result<i64> {
        let mut state = self.lock();
        let config = state
            .restaurants
            .get(&restaurant)
            .map(Restaurant::points_config)
            .ok_or_else(|| Error::procedure(PROC_REGISTER_SPEND, "Restaurante no encontrado"))?;
        if !state
            .customers
            .iter()
            .any(|c| c.id == customer && c.restaurante_id == restaurant)
        {
            return Err(Error::procedure(PROC_REGISTER_SPEND, "Cliente no encontrado"));
        }
        let points = points_for_spend(Some(amount), &config);
        if points > 0 {
            state.ledger.push(LedgerEntry {
                restaurant,
                customer,
                points,
            });
        }
        Ok(points)
    }

    async fn redeem(
        &self,
        restaurant: RestaurantId,
        customer: CustomerId,
        reward: RewardId,
    ) -> Result<()> {
        let mut state = self.lock();
        let cost = state
            .rewards
            .iter()
            .find(|r| r.id == reward && r.restaurante_id == restaurant && r.activo)
            .map(|r| r.puntos_requeridos)
            .ok_or_else(|| Error::procedure(PROC_REDEEM, "Premio no disponible"))?;
        if state.balance(restaurant, customer) < cost {
            return Err(Error::procedure(PROC_REDEEM, "Puntos insuficientes"));
        }
        state.ledger.push(LedgerEntry {
            restaurant,
            customer,
            points: -cost,
        });
        state.redemptions.push(Redemption {
            id: RedemptionId::new(),
            restaurante_id: restaurant,
            cliente_id: customer,
            premio_id: reward,
            puntos_usados: cost,
            estado: RedemptionStatus::Pending,
            creado_en: Utc::now(),
            confirmado_en: None,
        });
        Ok(())
    }

    async fn confirm_redemption(&self, restaurant: RestaurantId, id: RedemptionId) -> Result<()> {
        let mut state = self.lock();
        let r = state
            .redemptions
            .iter_mut()
            .find(|r| r.id == id && r.restaurante_id == restaurant)
            .ok_or_else(|| Error::procedure(PROC_CONFIRM_REDEMPTION, "Canje no encontrado"))?;
        if r.estado != RedemptionStatus::Pending {
            return Err(Error::procedure(PROC_CONFIRM_REDEMPTION, "Canje no pendiente"));
        }
        r.estado = RedemptionStatus::Confirmed;
        r.confirmado_en = Some(Utc::now());
        Ok(())
    }

    async fn cancel_redemption(&self, restaurant: RestaurantId, id: RedemptionId) -> Result<()> {
        let mut state = self.lock();
        let r = state
            .redemptions
            .iter_mut()
            .find(|r| r.id == id && r.restaurante_id == restaurant)
            .ok_or_else(|| Error::procedure(PROC_CANCEL_REDEMPTION, "Canje no encontrado"))?;
        if r.estado != RedemptionStatus::Pending {
            return Err(Error::procedure(PROC_CANCEL_REDEMPTION, "Canje no pendiente"));
        }
        r.estado = RedemptionStatus::Cancelled;
        let refund = LedgerEntry {
            restaurant,
            customer: r.cliente_id,
            points: r.puntos_usados,
        };
        state.ledger.push(refund);
        Ok(())
    }
}

// ============================================================================
// Coupons
// ============================================================================

#[async_trait]
impl CouponStore for MemoryStore {
    async fn list_coupons(
        &self,
        restaurant: RestaurantId,
        active_only: bool,
    ) -> Result<Vec<Coupon>> {
        let mut rows: Vec<Coupon> = self
            .lock()
            .coupons
            .iter()
            .filter(|c| c.restaurante_id == restaurant && (!active_only || c.activo))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.creado_en.cmp(&a.creado_en));
        Ok(rows)
    }

    async fn insert_coupon(&self, restaurant: RestaurantId, draft: &CouponDraft) -> Result<Coupon> {
        let row = Coupon {
            id: CouponId::new(),
            restaurante_id: restaurant,
            nombre: draft.nombre.clone(),
            beneficio: draft.beneficio.clone(),
            condiciones: Some(draft.condiciones.clone()),
            activo: draft.activo,
            creado_en: Some(Utc::now()),
        };
        self.lock().coupons.push(row.clone());
        Ok(row)
    }

    async fn update_coupon(
        &self,
        restaurant: RestaurantId,
        id: CouponId,
        draft: &CouponDraft,
    ) -> Result<Option<Coupon>> {
        let mut state = self.lock();
        let found = state
            .coupons
            .iter_mut()
            .find(|c| c.id == id && c.restaurante_id == restaurant);
        Ok(found.map(|c| {
            c.nombre = draft.nombre.clone();
            c.beneficio = draft.beneficio.clone();
            c.condiciones = Some(draft.condiciones.clone());
            c.activo = draft.activo;
            c.clone()
        }))
    }

    async fn set_coupon_active(
        &self,
        restaurant: RestaurantId,
        id: CouponId,
        active: bool,
    ) -> Result<Option<Coupon>> {
        let mut state = self.lock();
        let found = state
            .coupons
            .iter_mut()
            .find(|c| c.id == id && c.restaurante_id == restaurant);
        Ok(found.map(|c| {
            c.activo = active;
            c.clone()
        }))
    }

    async fn delete_coupon(&self, restaurant: RestaurantId, id: CouponId) -> Result<bool> {
        let mut state = self.lock();
        let before = state.coupons.len();
        state
            .coupons
            .retain(|c| !(c.id == id && c.restaurante_id == restaurant));
        Ok(state.coupons.len() < before)
    }
}
