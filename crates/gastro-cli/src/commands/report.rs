//! `gastro occupancy` and `gastro slack-day`.

use std::fmt::Write as _;

use chrono::NaiveDate;
use gastro_core::occupancy::{DayOccupancy, ServiceOccupancy};
use gastro_core::schedule::minutes_to_hhmm;
use gastro_service::{BackOffice, Tenant};

use crate::error::Result;

/// Occupancy of `date` (today when `None`) as a table or JSON.
pub async fn occupancy(
    office: &BackOffice,
    tenant: &Tenant,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<String> {
    let date = date.unwrap_or_else(|| office.today());
    let day = office.occupancy_on(tenant, date).await?;
    if json {
        return Ok(serde_json::to_string_pretty(&day).map_err(gastro_core::Error::from)?);
    }
    Ok(render_day(date, &day))
}

/// The emptiest remaining day of the week, as one line.
pub async fn slack_day(office: &BackOffice, tenant: &Tenant) -> Result<String> {
    Ok(match office.slack_day(tenant).await? {
        Some(day) => format!(
            "{} {}: {}% occupied",
            day.weekday_name(),
            day.date,
            day.occupancy
        ),
        None => "No slack day left this week".to_string(),
    })
}

fn render_day(date: NaiveDate, day: &DayOccupancy) -> String {
    let mut out = format!("Occupancy {date}: {}% average\n", day.total_pct);
    render_service(&mut out, &day.lunch);
    render_service(&mut out, &day.dinner);
    out
}

fn render_service(out: &mut String, service: &ServiceOccupancy) {
    let _ = writeln!(
        out,
        "\n{} {}-{} ({} seats, {}% average)",
        service.service,
        minutes_to_hhmm(service.window.start),
        minutes_to_hhmm(service.window.end),
        service.capacity,
        service.average_pct
    );
    for slot in &service.slots {
        let _ = writeln!(
            out,
            "  {:<15} {:>3} guests {:>4}%",
            slot.label(),
            slot.guests,
            slot.pct
        );
    }
}
