//! Reservation operations.

use super::{BackOffice, Tenant};
use crate::events::ChangeKind;
use crate::notify::{Notification, ReviewRequest, StatusChanged};
use chrono::Duration;
use gastro_core::customers::{NewCustomer, VisitRecord, normalize_name};
use gastro_core::loyalty::parse_spend;
use gastro_core::reservations::{
    AttendanceInput, DayCount, NewReservation, NewReservationInput, Reservation,
    ReservationCounters, ReservationFilter, ReservationListItem, ReservationStatus,
    local_day_bounds, weekly_counts,
};
use gastro_core::{CustomerId, Error, ReservationId, Result};
use gastro_store::ReservationQuery;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result of recording attendance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceOutcome {
    /// Reservation with attendance set.
    pub reservation: Reservation,
    /// Customer credited with the visit (attended only).
    pub customer_id: Option<CustomerId>,
    /// Points credited for the spend.
    pub points_awarded: i64,
}

impl BackOffice {
    /// Reservations passing `filter` whose name contains `search`.
    pub async fn list_reservations(
        &self,
        tenant: &Tenant,
        filter: ReservationFilter,
        search: Option<&str>,
    ) -> Result<Vec<ReservationListItem>> {
        let today = self.today();
        let query = match filter {
            ReservationFilter::All => ReservationQuery::all(),
            ReservationFilter::Today => {
                let (from, to) = local_day_bounds(today, &self.tz);
                ReservationQuery::between(from, to)
            }
            ReservationFilter::Pending => {
                ReservationQuery::all().with_status(ReservationStatus::Pending)
            }
        };
        let rows: Vec<Reservation> = self
            .store
            .list_reservations(tenant.restaurant, &query)
            .await?
            .into_iter()
            .filter(|r| filter.matches(r, today, &self.tz))
            .filter(|r| search.is_none_or(|s| r.matches_name(s)))
            .collect();

        let mut ids: Vec<CustomerId> = rows.iter().filter_map(|r| r.cliente_id).collect();
        ids.sort();
        ids.dedup();
        let reviewed: HashSet<CustomerId> = if ids.is_empty() {
            HashSet::new()
        } else {
            self.store
                .customers_by_ids(tenant.restaurant, &ids)
                .await?
                .into_iter()
                .filter(|c| c.ya_dejo_resena)
                .map(|c| c.id)
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|r| ReservationListItem {
                customer_reviewed: r.cliente_id.is_some_and(|c| reviewed.contains(&c)),
                reservation: r,
            })
            .collect())
    }

    /// Books a reservation from the panel.
    ///
    /// The customer is matched by phone or created; the reservation starts
    /// out pending.
    pub async fn create_reservation(
        &self,
        tenant: &Tenant,
        input: NewReservationInput,
    ) -> Result<Reservation> {
        let request = input.validate(&self.tz)?;

        let customer = match self
            .store
            .find_customer_by_phone(tenant.restaurant, &request.phone)
            .await?
        {
            Some(c) => c,
            None => {
                let new = NewCustomer::from_panel(tenant.restaurant, &request.name, &request.phone);
                let created = self.store.insert_customer(&new).await?;
                self.publish(
                    tenant.restaurant,
                    ChangeKind::CustomerChanged {
                        customer_id: created.id,
                    },
                );
                created
            }
        };

        let reservation = self
            .store
            .insert_reservation(&NewReservation::from_panel(
                tenant.restaurant,
                customer.id,
                request,
            ))
            .await?;

        tracing::info!(
            restaurant = %tenant.restaurant,
            reservation = %reservation.id,
            guests = reservation.guests(),
            "Reservation created"
        );
        self.publish(
            tenant.restaurant,
            ChangeKind::ReservationCreated {
                reservation_id: reservation.id,
            },
        );
        Ok(reservation)
    }

    /// Changes a reservation's state and notifies the automation.
    pub async fn set_reservation_status(
        &self,
        tenant: &Tenant,
        id: ReservationId,
        status: ReservationStatus,
    ) -> Result<Reservation> {
        let reservation = self
            .store
            .update_reservation_status(tenant.restaurant, id, status)
            .await?
            .ok_or_else(|| Error::not_found("reservation", id))?;

        tracing::info!(restaurant = %tenant.restaurant, reservation = %id, %status, "Reservation status changed");
        self.publish(
            tenant.restaurant,
            ChangeKind::ReservationStatusChanged {
                reservation_id: id,
                status,
            },
        );
        self.notify(Notification::StatusChanged(StatusChanged {
            reserva_id: id,
            estado: status,
            restaurante_id: tenant.restaurant,
        }))
        .await;
        Ok(reservation)
    }

    /// Records whether the party showed up. Allowed once per reservation.
    ///
    /// A show credits the visit to the customer with the booking's phone
    /// (created if needed), accrues points for a positive spend when the
    /// programme is on, writes the visit into the customer history and asks
    /// the automation for a review.
    pub async fn mark_attendance(
        &self,
        tenant: &Tenant,
        id: ReservationId,
        input: AttendanceInput,
    ) -> Result<AttendanceOutcome> {
        let _claim = self.claim_attendance(id)?;

        let reservation = self
            .store
            .get_reservation(tenant.restaurant, id)
            .await?
            .ok_or_else(|| Error::not_found("reservation", id))?;
        if reservation.atendida.is_some() {
            return Err(Error::conflict("attendance already recorded"));
        }

        let restaurant = self.restaurant(tenant).await?;
        let points = restaurant.points_config();
        let spend = if points.enabled {
            input.spend.as_deref().and_then(parse_spend)
        } else {
            None
        };

        let updated = self
            .store
            .record_attendance(tenant.restaurant, id, input.attended)
            .await?
            .ok_or_else(|| Error::conflict("attendance already recorded"))?;
        self.publish(
            tenant.restaurant,
            ChangeKind::AttendanceRecorded {
                reservation_id: id,
                attended: input.attended,
            },
        );

        if !input.attended {
            tracing::info!(restaurant = %tenant.restaurant, reservation = %id, "No-show recorded");
            return Ok(AttendanceOutcome {
                reservation: updated,
                customer_id: None,
                points_awarded: 0,
            });
        }

        let name = reservation.nombre_cliente.clone().unwrap_or_default();
        let phone = reservation
            .telefono
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        let existing = match phone {
            Some(p) => self.store.find_customer_by_phone(tenant.restaurant, p).await?,
            None => None,
        };
        let customer = match existing {
            Some(c) => c,
            None => {
                self.store
                    .insert_customer(&NewCustomer {
                        restaurante_id: tenant.restaurant,
                        nombre: name.trim().to_string(),
                        nombre_normalizado: normalize_name(&name),
                        telefono: phone.map(str::to_string),
                        visitas_totales: 0,
                        ultima_visita: None,
                        canal_contacto: None,
                    })
                    .await?
            }
        };

        let mut points_awarded = 0;
        if let Some(amount) = spend.filter(|a| *a > 0.0) {
            match self
                .store
                .register_spend(tenant.restaurant, customer.id, amount)
                .await
            {
                Ok(credited) => points_awarded = credited,
                Err(e) => tracing::warn!(
                    reservation = %id,
                    customer = %customer.id,
                    error = %e,
                    "Spend not credited"
                ),
            }
        }

        let mut visit = VisitRecord::visit(
            customer.id,
            tenant.restaurant,
            reservation.fecha_hora_reserva,
            reservation.personas,
        );
        visit.reserva_id = Some(id);
        visit.gasto_eur = spend;
        if let Err(e) = self.store.upsert_reservation_visit(&visit).await {
            tracing::warn!(reservation = %id, error = %e, "Visit not written to history");
        }

        tracing::info!(
            restaurant = %tenant.restaurant,
            reservation = %id,
            customer = %customer.id,
            points = points_awarded,
            "Attendance recorded"
        );
        self.publish(
            tenant.restaurant,
            ChangeKind::CustomerChanged {
                customer_id: customer.id,
            },
        );
        self.notify(Notification::ReviewRequest(ReviewRequest {
            reserva_id: id,
            restaurante_id: tenant.restaurant,
            cliente_id: customer.id,
            email: reservation.email.clone(),
            nombre: reservation.nombre_cliente.clone(),
            telefono: reservation.telefono.clone(),
            resena_solicitada: reservation.resena_solicitada,
            ya_dejo_resena: customer.ya_dejo_resena,
            gasto_eur: spend,
            puntos_activo: points.enabled,
            puntos_por_euro: points.points_per_euro,
        }))
        .await;

        Ok(AttendanceOutcome {
            reservation: updated,
            customer_id: Some(customer.id),
            points_awarded,
        })
    }

    /// Reservations today and pending confirmations.
    pub async fn reservation_counters(&self, tenant: &Tenant) -> Result<ReservationCounters> {
        let (from, to) = local_day_bounds(self.today(), &self.tz);
        let today = self
            .store
            .count_reservations(
                tenant.restaurant,
                &ReservationQuery::between(from, to).active_only(),
            )
            .await?;
        let pending = self
            .store
            .count_reservations(
                tenant.restaurant,
                &ReservationQuery::all().with_status(ReservationStatus::Pending),
            )
            .await?;
        Ok(ReservationCounters { today, pending })
    }

    /// Reservations per day over the last seven days.
    pub async fn weekly_chart(&self, tenant: &Tenant) -> Result<Vec<DayCount>> {
        let today = self.today();
        let (from, _) = local_day_bounds(today - Duration::days(6), &self.tz);
        let (_, to) = local_day_bounds(today, &self.tz);
        let rows = self
            .store
            .list_reservations(tenant.restaurant, &ReservationQuery::between(from, to))
            .await?;
        Ok(weekly_counts(&rows, today, &self.tz))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::testing::{Harness, local, today};
    use super::*;
    use gastro_core::restaurant::SettingsInput;
    use gastro_store::{CustomerStore, LoyaltyStore, RestaurantStore};

    fn booking(phone: &str) -> NewReservationInput {
        NewReservationInput {
            name: "Lucía Gómez".into(),
            phone: phone.into(),
            email: Some("lucia@example.com".into()),
            date: Some(today()),
            time: "21:00".into(),
            guests: Some(4),
        }
    }

    fn attended(spend: Option<&str>) -> AttendanceInput {
        AttendanceInput {
            attended: true,
            spend: spend.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_reservation_creates_customer() {
        let h = Harness::new().await;
        let r = h
            .office
            .create_reservation(&h.tenant, booking("600999888"))
            .await
            .unwrap();
        assert_eq!(r.estado, ReservationStatus::Pending);
        assert_eq!(r.fecha_hora_reserva, local(today(), 21, 0));

        let customer = h
            .store
            .find_customer_by_phone(h.restaurant(), "600999888")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(r.cliente_id, Some(customer.id));
        assert_eq!(customer.visitas_totales, 0);
    }

    #[tokio::test]
    async fn test_create_reservation_reuses_customer_by_phone() {
        let h = Harness::new().await;
        let existing = h.customer("Lucía", "600999888").await;
        let r = h
            .office
            .create_reservation(&h.tenant, booking("600999888"))
            .await
            .unwrap();
        assert_eq!(r.cliente_id, Some(existing.id));
        assert_eq!(h.store.list_customers(h.restaurant()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_reservation_rejects_zero_guests() {
        let h = Harness::new().await;
        let mut input = booking("600999888");
        input.guests = Some(0);
        let err = h.office.create_reservation(&h.tenant, input).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn test_status_change_notifies() {
        let h = Harness::new().await;
        let r = h.reservation(local(today(), 21, 0), 2, ReservationStatus::Pending, None);
        let updated = h
            .office
            .set_reservation_status(&h.tenant, r.id, ReservationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(updated.estado, ReservationStatus::Confirmed);

        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        let Notification::StatusChanged(body) = &sent[0] else {
            unreachable!("expected a status notification");
        };
        assert_eq!(body.reserva_id, r.id);
        assert_eq!(body.estado, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_status_change_other_tenant_not_found() {
        let h = Harness::new().await;
        let other = Harness::new().await;
        let r = other.reservation(local(today(), 21, 0), 2, ReservationStatus::Pending, None);
        let err = h
            .office
            .set_reservation_status(&h.tenant, r.id, ReservationStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_attendance_credits_points_and_history() {
        let h = Harness::new().await;
        let r = h.reservation(local(today(), 21, 0), 3, ReservationStatus::Confirmed, None);

        let outcome = h
            .office
            .mark_attendance(&h.tenant, r.id, attended(Some("42,80")))
            .await
            .unwrap();
        assert_eq!(outcome.points_awarded, 42);
        assert_eq!(outcome.reservation.atendida, Some(true));

        let customer = outcome.customer_id.unwrap();
        assert_eq!(h.store.balance(h.restaurant(), customer).await.unwrap(), 42);

        let visits = h.store.list_visits(h.restaurant(), customer).await.unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].reserva_id, Some(r.id));
        assert_eq!(visits[0].gasto_eur, Some(42.8));
        assert_eq!(visits[0].personas, Some(3));

        let sent = h.notifier.sent();
        let Notification::ReviewRequest(body) = &sent[0] else {
            unreachable!("expected a review request");
        };
        assert_eq!(body.cliente_id, customer);
        assert!(body.puntos_activo);
    }

    #[tokio::test]
    async fn test_attendance_only_once() {
        let h = Harness::new().await;
        let r = h.reservation(local(today(), 21, 0), 2, ReservationStatus::Confirmed, None);
        h.office
            .mark_attendance(&h.tenant, r.id, attended(None))
            .await
            .unwrap();
        let err = h
            .office
            .mark_attendance(&h.tenant, r.id, attended(None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_no_show_touches_nothing_else() {
        let h = Harness::new().await;
        let r = h.reservation(local(today(), 21, 0), 2, ReservationStatus::Confirmed, None);
        let outcome = h
            .office
            .mark_attendance(
                &h.tenant,
                r.id,
                AttendanceInput {
                    attended: false,
                    spend: Some("30".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.reservation.atendida, Some(false));
        assert_eq!(outcome.customer_id, None);
        assert!(h.store.list_customers(h.restaurant()).await.unwrap().is_empty());
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_attendance_reuses_customer_by_phone() {
        let h = Harness::new().await;
        let existing = h.customer("Ana", "600111222").await;
        let r = h.reservation(local(today(), 14, 0), 2, ReservationStatus::Confirmed, None);
        let outcome = h
            .office
            .mark_attendance(&h.tenant, r.id, attended(None))
            .await
            .unwrap();
        assert_eq!(outcome.customer_id, Some(existing.id));
        assert_eq!(outcome.points_awarded, 0);
    }

    #[tokio::test]
    async fn test_attendance_spend_ignored_when_points_off() {
        let h = Harness::new().await;
        let mut restaurant = h
            .store
            .get_restaurant(h.restaurant())
            .await
            .unwrap()
            .unwrap();
        restaurant.points_per_euro = Some(0.0);
        h.store.add_restaurant(restaurant);

        let r = h.reservation(local(today(), 14, 0), 2, ReservationStatus::Confirmed, None);
        let outcome = h
            .office
            .mark_attendance(&h.tenant, r.id, attended(Some("50")))
            .await
            .unwrap();
        assert_eq!(outcome.points_awarded, 0);
        let customer = outcome.customer_id.unwrap();
        assert_eq!(h.store.balance(h.restaurant(), customer).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_attendance_after_points_switched_off_in_settings() {
        let h = Harness::new().await;
        let saved = h
            .office
            .update_settings(
                &h.tenant,
                SettingsInput {
                    name: "Casa Pepe".into(),
                    points_enabled: false,
                    points_per_euro: String::new(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.points_enabled, Some(false));
        assert_eq!(saved.points_per_euro, Some(1.0));

        let r = h.reservation(local(today(), 21, 0), 2, ReservationStatus::Confirmed, None);
        let outcome = h
            .office
            .mark_attendance(&h.tenant, r.id, attended(Some("50")))
            .await
            .unwrap();
        assert_eq!(outcome.points_awarded, 0);
        let customer = outcome.customer_id.unwrap();
        assert_eq!(h.store.balance(h.restaurant(), customer).await.unwrap(), 0);

        let sent = h.notifier.sent();
        let Some(Notification::ReviewRequest(body)) = sent.last() else {
            unreachable!("expected a review request");
        };
        assert!(!body.puntos_activo);
        assert_eq!(body.gasto_eur, None);
    }

    #[tokio::test]
    async fn test_list_filters_and_review_flag() {
        let h = Harness::new().await;
        let reviewed = h.customer("Ana", "600111222").await;
        h.store.edit_customer(reviewed.id, |c| c.ya_dejo_resena = true);
        h.reservation(local(today(), 14, 0), 2, ReservationStatus::Pending, Some(reviewed.id));
        h.reservation(
            local(today() + Duration::days(1), 21, 0),
            2,
            ReservationStatus::Confirmed,
            None,
        );

        let all = h
            .office
            .list_reservations(&h.tenant, ReservationFilter::All, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].customer_reviewed);
        assert!(!all[1].customer_reviewed);

        let today_only = h
            .office
            .list_reservations(&h.tenant, ReservationFilter::Today, None)
            .await
            .unwrap();
        assert_eq!(today_only.len(), 1);

        let searched = h
            .office
            .list_reservations(&h.tenant, ReservationFilter::All, Some("nobody"))
            .await
            .unwrap();
        assert!(searched.is_empty());
    }

    #[tokio::test]
    async fn test_counters_and_weekly_chart() {
        let h = Harness::new().await;
        h.reservation(local(today(), 14, 0), 2, ReservationStatus::Pending, None);
        h.reservation(local(today(), 21, 0), 2, ReservationStatus::Cancelled, None);
        h.reservation(
            local(today() - Duration::days(2), 21, 0),
            2,
            ReservationStatus::Confirmed,
            None,
        );

        let counters = h.office.reservation_counters(&h.tenant).await.unwrap();
        assert_eq!(counters.today, 1);
        assert_eq!(counters.pending, 1);

        h.reservation(
            local(today() + Duration::days(1), 0, 30),
            2,
            ReservationStatus::Pending,
            None,
        );
        let counters = h.office.reservation_counters(&h.tenant).await.unwrap();
        assert_eq!(counters.today, 1);
        assert_eq!(counters.pending, 2);

        let pending = h
            .office
            .list_reservations(&h.tenant, ReservationFilter::Pending, None)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let chart = h.office.weekly_chart(&h.tenant).await.unwrap();
        assert_eq!(chart.len(), 7);
        assert_eq!(chart[6].date, today());
        assert_eq!(chart[6].count, 2);
        assert_eq!(chart[4].count, 1);
    }

    #[tokio::test]
    async fn test_attendance_missing_reservation_releases_claim() {
        let h = Harness::new().await;
        let id = ReservationId::new();
        let err = h
            .office
            .mark_attendance(&h.tenant, id, attended(None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(h.office.claim_attendance(id).is_ok());
    }
}
