//! The dashboard summary.

use super::{BackOffice, Tenant};
use gastro_core::Result;
use gastro_core::alerts::{
    Action, Alert, Impact, derive_actions, derive_alerts, peak_cancellations,
};
use gastro_core::occupancy::Headline;
use gastro_core::reservations::{DayCount, ReservationCounters, local_day_bounds};
use gastro_core::reviews::ReviewCounters;
use gastro_store::ReservationQuery;
use serde::{Deserialize, Serialize};

/// Everything on the dashboard page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Today's and pending reservations.
    pub reservations: ReservationCounters,
    /// Pending and negative reviews.
    pub reviews: ReviewCounters,
    /// Customers created today.
    pub new_customers_today: usize,
    /// Occupancy of the service in progress.
    pub headline: Headline,
    /// `"Lunch · 13:00 - 16:00"`.
    pub headline_context: String,
    /// To-do items.
    pub actions: Vec<Action>,
    /// Warnings.
    pub alerts: Vec<Alert>,
    /// Impact counters.
    pub impact: Impact,
    /// Reservations per day over the last week.
    pub weekly: Vec<DayCount>,
}

impl BackOffice {
    /// Builds the dashboard for the caller's restaurant.
    pub async fn dashboard(&self, tenant: &Tenant) -> Result<Dashboard> {
        let reservations = self.reservation_counters(tenant).await?;
        let reviews = self.store.list_reviews(tenant.restaurant).await?;
        let review_counters = ReviewCounters::from_reviews(&reviews);
        let new_customers_today = self.new_customers_today(tenant).await?;
        let headline = self.headline(tenant).await?;
        let weekly = self.weekly_chart(tenant).await?;

        let (start, end) = local_day_bounds(self.today(), &self.tz);
        let today = self
            .store
            .list_reservations(tenant.restaurant, &ReservationQuery::between(start, end))
            .await?;
        let peak_gaps = peak_cancellations(&today, &self.tz);

        Ok(Dashboard {
            actions: derive_actions(review_counters.pending, reservations.pending),
            alerts: derive_alerts(&reviews, peak_gaps, headline.pct),
            impact: Impact {
                peak_gaps,
                at_risk: reservations.pending,
            },
            headline_context: headline.context(),
            reservations,
            reviews: review_counters,
            new_customers_today,
            headline,
            weekly,
        })
    }
}
