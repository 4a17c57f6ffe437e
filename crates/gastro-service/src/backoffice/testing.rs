//! Shared fixtures for the back-office tests.

#![allow(clippy::unwrap_used)]

use super::{BackOffice, Tenant};
use crate::clock::FixedClock;
use crate::config::ServiceConfig;
use crate::notify::RecordingNotifier;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Europe::Madrid;
use gastro_core::customers::{Customer, NewCustomer};
use gastro_core::reservations::{Reservation, ReservationStatus};
use gastro_core::restaurant::Restaurant;
use gastro_core::{CustomerId, ReservationId, RestaurantId, UserId};
use gastro_store::{CustomerStore, MemoryStore};
use std::sync::Arc;

/// Friday 2026-10-16, 12:00 in Madrid.
pub(crate) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap()
}

pub(crate) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

/// Madrid local time on `date`, as UTC.
pub(crate) fn local(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    Madrid
        .from_local_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc)
}

pub(crate) struct Harness {
    pub office: BackOffice,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub tenant: Tenant,
}

impl Harness {
    /// Restaurant with 13:00-16:00 lunch and 20:00-23:00 dinner, 50 seats
    /// each, one point per euro.
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let restaurant = RestaurantId::new();
        let mut r = Restaurant::new(restaurant, "Casa Pepe");
        r.lunch_schedule = Some("13:00-16:00".into());
        r.dinner_schedule = Some("20:00-23:00".into());
        r.lunch_capacity = Some(50);
        r.dinner_capacity = Some(50);
        r.points_enabled = Some(true);
        r.points_per_euro = Some(1.0);
        store.add_restaurant(r);

        let user = UserId::new();
        store.add_member(user, restaurant);

        let clock = Arc::new(FixedClock::new(start()));
        let notifier = Arc::new(RecordingNotifier::new());
        let office = BackOffice::new(store.clone(), &ServiceConfig::default())
            .unwrap()
            .with_clock(clock.clone())
            .with_notifier(notifier.clone());

        Self {
            office,
            store,
            clock,
            notifier,
            tenant: Tenant { user, restaurant },
        }
    }

    pub fn restaurant(&self) -> RestaurantId {
        self.tenant.restaurant
    }

    pub async fn customer(&self, name: &str, phone: &str) -> Customer {
        self.store
            .insert_customer(&NewCustomer::from_panel(self.restaurant(), name, phone))
            .await
            .unwrap()
    }

    /// Seeds a reservation directly in the store.
    pub fn reservation(
        &self,
        at: DateTime<Utc>,
        guests: u32,
        status: ReservationStatus,
        customer: Option<CustomerId>,
    ) -> Reservation {
        let r = Reservation {
            id: ReservationId::new(),
            restaurante_id: self.restaurant(),
            cliente_id: customer,
            nombre_cliente: Some("Ana".into()),
            telefono: Some("600111222".into()),
            email: Some("ana@example.com".into()),
            personas: Some(guests),
            fecha_hora_reserva: at,
            estado: status,
            atendida: None,
            resena_solicitada: false,
            origen: Some("panel".into()),
        };
        self.store.add_reservation(r.clone());
        r
    }
}
