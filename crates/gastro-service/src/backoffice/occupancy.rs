//! Occupancy figures from the booked reservations.

use super::{BackOffice, Tenant};
use chrono::{NaiveDate, Timelike};
use gastro_core::Result;
use gastro_core::occupancy::{
    self, Booking, DayLoad, DayOccupancy, Headline, current_headline, day_total_pct,
    remaining_week,
};
use gastro_core::reservations::{Reservation, local_day_bounds};
use gastro_store::ReservationQuery;
use std::collections::HashMap;

impl BackOffice {
    /// Active reservations booked between the start of `from` and the end
    /// of `to`, local days.
    async fn active_between(
        &self,
        tenant: &Tenant,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>> {
        let (start, _) = local_day_bounds(from, &self.tz);
        let (_, end) = local_day_bounds(to, &self.tz);
        self.store
            .list_reservations(
                tenant.restaurant,
                &ReservationQuery::between(start, end).active_only(),
            )
            .await
    }

    fn bookings(&self, reservations: &[Reservation]) -> Vec<Booking> {
        reservations.iter().map(|r| r.booking(&self.tz)).collect()
    }

    fn now_minute(&self) -> u32 {
        let now = self.local_now();
        now.hour() * 60 + now.minute()
    }

    /// Hourly occupancy of both services on `date`.
    ///
    /// The current slot is only marked when `date` is today.
    pub async fn occupancy_on(&self, tenant: &Tenant, date: NaiveDate) -> Result<DayOccupancy> {
        let plan = self.restaurant(tenant).await?.capacity_plan();
        let reservations = self.active_between(tenant, date, date).await?;
        let now = (date == self.today()).then(|| self.now_minute());
        Ok(DayOccupancy::compute(
            &plan,
            &self.bookings(&reservations),
            now,
        ))
    }

    /// Hourly occupancy of today.
    pub async fn occupancy_today(&self, tenant: &Tenant) -> Result<DayOccupancy> {
        self.occupancy_on(tenant, self.today()).await
    }

    /// Day averages for today and the rest of the week.
    pub async fn week_load(&self, tenant: &Tenant) -> Result<Vec<DayLoad>> {
        let plan = self.restaurant(tenant).await?.capacity_plan();
        let days = remaining_week(self.today());
        let (Some(first), Some(last)) = (days.first(), days.last()) else {
            return Ok(Vec::new());
        };

        let mut by_day: HashMap<NaiveDate, Vec<Booking>> = HashMap::new();
        for r in self.active_between(tenant, *first, *last).await? {
            by_day
                .entry(r.local_date(&self.tz))
                .or_default()
                .push(r.booking(&self.tz));
        }

        Ok(days
            .into_iter()
            .map(|date| DayLoad {
                date,
                occupancy: day_total_pct(&plan, by_day.get(&date).map_or(&[], Vec::as_slice)),
            })
            .collect())
    }

    /// Emptiest remaining day of the week under the configured threshold.
    pub async fn slack_day(&self, tenant: &Tenant) -> Result<Option<DayLoad>> {
        let week = self.week_load(tenant).await?;
        let slack = occupancy::slack_day(&week, self.slack_threshold);
        tracing::debug!(
            restaurant = %tenant.restaurant,
            threshold = self.slack_threshold,
            found = slack.is_some(),
            "Slack day evaluated"
        );
        Ok(slack)
    }

    /// Dashboard figure for the service in progress.
    pub async fn headline(&self, tenant: &Tenant) -> Result<Headline> {
        let plan = self.restaurant(tenant).await?.capacity_plan();
        let today = self.today();
        let reservations = self.active_between(tenant, today, today).await?;
        Ok(current_headline(
            &plan,
            &self.bookings(&reservations),
            self.now_minute(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::testing::{Harness, local, today};
    use super::*;
    use chrono::Duration;
    use gastro_core::reservations::ReservationStatus;
    use gastro_core::schedule::Service;

    #[tokio::test]
    async fn test_today_slots() {
        let h = Harness::new().await;
        h.reservation(local(today(), 13, 30), 32, ReservationStatus::Confirmed, None);
        h.reservation(local(today(), 21, 0), 46, ReservationStatus::Pending, None);
        h.reservation(local(today(), 21, 15), 10, ReservationStatus::Cancelled, None);
        h.reservation(
            local(today() + Duration::days(1), 13, 0),
            20,
            ReservationStatus::Confirmed,
            None,
        );

        let day = h.office.occupancy_today(&h.tenant).await.unwrap();
        assert_eq!(day.lunch.slots[0].pct, 64);
        assert_eq!(day.dinner.slots[1].pct, 92);
        assert_eq!(day.lunch.hours()[0], "13:00 - 14:00");
        // 12:00 local is before lunch opens.
        assert_eq!(day.lunch.current_pct, 0);
    }

    #[tokio::test]
    async fn test_other_day_has_no_current_slot() {
        let h = Harness::new().await;
        let tomorrow = today() + Duration::days(1);
        h.reservation(local(tomorrow, 13, 10), 25, ReservationStatus::Confirmed, None);
        h.clock.set(local(today(), 13, 30));

        let day = h.office.occupancy_on(&h.tenant, tomorrow).await.unwrap();
        assert_eq!(day.lunch.slots[0].pct, 50);
        assert_eq!(day.lunch.current_pct, 0);

        let now = h.office.occupancy_today(&h.tenant).await.unwrap();
        assert_eq!(now.lunch.current_pct, 0);
    }

    #[tokio::test]
    async fn test_headline_in_service() {
        let h = Harness::new().await;
        h.reservation(local(today(), 14, 0), 40, ReservationStatus::Confirmed, None);
        h.reservation(local(today(), 15, 0), 20, ReservationStatus::Confirmed, None);
        h.clock.set(local(today(), 14, 30));

        let headline = h.office.headline(&h.tenant).await.unwrap();
        assert_eq!(headline.service, Service::Lunch);
        assert_eq!(headline.pct, 120);
    }

    #[tokio::test]
    async fn test_week_and_slack_day() {
        let h = Harness::new().await;
        // Friday: busy today, empty Saturday, some Sunday.
        for hour in [13, 14, 15, 20, 21, 22] {
            h.reservation(local(today(), hour, 0), 40, ReservationStatus::Confirmed, None);
        }
        h.reservation(
            local(today() + Duration::days(2), 21, 0),
            30,
            ReservationStatus::Confirmed,
            None,
        );

        let week = h.office.week_load(&h.tenant).await.unwrap();
        assert_eq!(week.len(), 3);
        assert_eq!(week[0].occupancy, 80);
        assert_eq!(week[1].occupancy, 0);
        assert_eq!(week[2].occupancy, 10);

        let slack = h.office.slack_day(&h.tenant).await.unwrap().unwrap();
        assert_eq!(slack.date, today() + Duration::days(1));
        assert_eq!(slack.weekday_name(), "Saturday");
    }

    #[tokio::test]
    async fn test_no_slack_day_when_full() {
        let h = Harness::new().await;
        for offset in 0..3 {
            for hour in [13, 14, 15, 20, 21, 22] {
                h.reservation(
                    local(today() + Duration::days(offset), hour, 0),
                    50,
                    ReservationStatus::Confirmed,
                    None,
                );
            }
        }
        assert!(h.office.slack_day(&h.tenant).await.unwrap().is_none());
    }
}
