//! Demo tenant for the in-memory backend.

use chrono::Duration;
use gastro_core::customers::{Customer, normalize_name};
use gastro_core::loyalty::RewardInput;
use gastro_core::reservations::{NewReservationInput, ReservationStatus};
use gastro_core::restaurant::Restaurant;
use gastro_core::{CustomerId, RestaurantId, Result, UserId};
use gastro_service::{BackOffice, Tenant};
use gastro_store::MemoryStore;

/// Public-page token of the demo customer.
pub const DEMO_TOKEN: &str = "demo";

/// Seeds a restaurant, its staff member and a day of activity.
///
/// Bookings are placed relative to the office's current local date.
pub async fn seed_demo(store: &MemoryStore, office: &BackOffice) -> Result<Tenant> {
    let restaurant = RestaurantId::new();
    let user = UserId::new();

    let mut r = Restaurant::new(restaurant, "Casa Demo");
    r.phone = Some("910000000".into());
    r.lunch_schedule = Some("13:00-16:00".into());
    r.dinner_schedule = Some("20:00-23:30".into());
    r.lunch_capacity = Some(40);
    r.dinner_capacity = Some(50);
    r.total_capacity = Some(60);
    r.points_enabled = Some(true);
    r.points_per_euro = Some(1.0);
    store.add_restaurant(r);
    store.add_member(user, restaurant);
    let tenant = Tenant { user, restaurant };

    let today = office.today();
    let bookings = [
        ("Lucía Martín", "600100200", 0, "14:00", 4, ReservationStatus::Confirmed),
        ("Javier Ruiz", "600300400", 0, "21:00", 6, ReservationStatus::Pending),
        ("Marta Gil", "600500600", 0, "21:30", 2, ReservationStatus::Confirmed),
        ("Pablo Sanz", "600700800", 1, "21:00", 8, ReservationStatus::Pending),
    ];
    for (name, phone, days, time, guests, status) in bookings {
        let reservation = office
            .create_reservation(
                &tenant,
                NewReservationInput {
                    name: name.into(),
                    phone: phone.into(),
                    email: None,
                    date: Some(today + Duration::days(days)),
                    time: time.into(),
                    guests: Some(guests),
                },
            )
            .await?;
        if status != ReservationStatus::Pending {
            office
                .set_reservation_status(&tenant, reservation.id, status)
                .await?;
        }
    }

    for (name, cost) in [("Café", 50), ("Postre de la casa", 100), ("Menú del día", 300)] {
        office
            .create_reward(
                &tenant,
                RewardInput {
                    name: name.into(),
                    points_required: cost,
                    ..RewardInput::default()
                },
            )
            .await?;
    }

    let customer = CustomerId::new();
    store.add_customer(Customer {
        id: customer,
        restaurante_id: restaurant,
        nombre: Some("Elena Torres".into()),
        nombre_normalizado: Some(normalize_name("Elena Torres")),
        telefono: Some("600900100".into()),
        visitas_totales: 6,
        ultima_visita: Some(office.now() - Duration::days(3)),
        canal_contacto: Some("panel".into()),
        fecha_nacimiento: None,
        public_token: Some(DEMO_TOKEN.into()),
        ya_dejo_resena: true,
        created_at: Some(office.now() - Duration::days(90)),
    });
    store.adjust_points(restaurant, customer, 180);

    tracing::info!(%restaurant, %user, token = DEMO_TOKEN, "Seeded demo restaurant");
    Ok(tenant)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gastro_service::ServiceConfig;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_seeded_demo_is_usable() {
        let store = Arc::new(MemoryStore::new());
        let office = BackOffice::new(store.clone(), &ServiceConfig::default()).unwrap();
        let tenant = seed_demo(&store, &office).await.unwrap();

        assert_eq!(office.resolve_tenant(tenant.user).await.unwrap(), tenant);

        let counters = office.reservation_counters(&tenant).await.unwrap();
        assert_eq!(counters.today, 3);
        assert_eq!(counters.pending, 2);

        let page = office.public_page(DEMO_TOKEN).await.unwrap();
        assert_eq!(page.points, 180);
        assert_eq!(page.rewards.len(), 3);
    }
}
