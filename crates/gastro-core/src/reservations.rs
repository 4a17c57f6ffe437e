//! Reservations: records, panel bookings, filters and counters.

use crate::error::{Error, Result};
use crate::ids::{CustomerId, ReservationId, RestaurantId};
use crate::occupancy::{Booking, local_minute};
use crate::schedule::parse_hhmm;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of reservations booked from the panel.
pub const ORIGIN_PANEL: &str = "panel";

/// Largest party a single booking may hold.
pub const MAX_PARTY_SIZE: u32 = 1000;

/// Reservation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// Waiting for confirmation.
    #[serde(rename = "pendiente")]
    Pending,
    /// Confirmed by staff.
    #[serde(rename = "confirmada")]
    Confirmed,
    /// Cancelled.
    #[serde(rename = "cancelada")]
    Cancelled,
}

impl ReservationStatus {
    /// Persisted name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pendiente",
            ReservationStatus::Confirmed => "confirmada",
            ReservationStatus::Cancelled => "cancelada",
        }
    }

    /// Whether the reservation still takes seats.
    pub fn is_active(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation (`reservas` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation id.
    pub id: ReservationId,
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Linked customer.
    #[serde(default)]
    pub cliente_id: Option<CustomerId>,
    /// Name the booking was made under.
    #[serde(default)]
    pub nombre_cliente: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub telefono: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Party size; missing counts as zero.
    #[serde(default)]
    pub personas: Option<u32>,
    /// Booked time.
    pub fecha_hora_reserva: DateTime<Utc>,
    /// Current state.
    pub estado: ReservationStatus,
    /// Attendance: unset, attended or no-show.
    #[serde(default)]
    pub atendida: Option<bool>,
    /// Whether a review request was already sent.
    #[serde(default)]
    pub resena_solicitada: bool,
    /// Where the booking came from.
    #[serde(default)]
    pub origen: Option<String>,
}

impl Reservation {
    /// Party size with missing treated as zero.
    pub fn guests(&self) -> u32 {
        self.personas.unwrap_or(0)
    }

    /// Local minute of day of the booking.
    pub fn local_minute<Tz: TimeZone>(&self, tz: &Tz) -> u32 {
        local_minute(self.fecha_hora_reserva, tz)
    }

    /// Local calendar date of the booking.
    pub fn local_date<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.fecha_hora_reserva.with_timezone(tz).date_naive()
    }

    /// Input for the occupancy estimator.
    pub fn booking<Tz: TimeZone>(&self, tz: &Tz) -> Booking {
        Booking::at(self.fecha_hora_reserva, tz, self.guests())
    }

    /// Case-insensitive match of the booking name.
    pub fn matches_name(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.nombre_cliente
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&needle))
    }
}

/// UTC bounds of a local calendar day, both inclusive.
pub fn local_day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let to_utc = |d: NaiveDate| {
        let midnight = d.and_time(NaiveTime::MIN);
        tz.from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
    };
    let start = to_utc(date);
    let end = to_utc(date + Duration::days(1)) - Duration::milliseconds(1);
    (start, end)
}

// ============================================================================
// Panel booking
// ============================================================================

/// Booking form submitted from the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservationInput {
    /// Customer name.
    #[serde(default)]
    pub name: String,
    /// Customer phone.
    #[serde(default)]
    pub phone: String,
    /// Optional email.
    #[serde(default)]
    pub email: Option<String>,
    /// Local date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Local time, `"HH:MM"`.
    #[serde(default)]
    pub time: String,
    /// Party size.
    #[serde(default)]
    pub guests: Option<u32>,
}

/// A validated panel booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRequest {
    /// Trimmed name.
    pub name: String,
    /// Trimmed phone.
    pub phone: String,
    /// Email, if given.
    pub email: Option<String>,
    /// Booked time.
    pub at: DateTime<Utc>,
    /// Party size.
    pub guests: u32,
}

impl NewReservationInput {
    /// Validates the form and converts the local date and time to UTC.
    pub fn validate<Tz: TimeZone>(self, tz: &Tz) -> Result<ReservationRequest> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation_field("name", "must not be empty"));
        }
        let phone = self.phone.trim().to_string();
        if phone.is_empty() {
            return Err(Error::validation_field("phone", "must not be empty"));
        }
        let date = self
            .date
            .ok_or_else(|| Error::validation_field("date", "is required"))?;
        let minute = parse_hhmm(&self.time)
            .filter(|m| *m < 24 * 60)
            .ok_or_else(|| Error::validation_field("time", "expected HH:MM"))?;
        let guests = self
            .guests
            .filter(|g| *g > 0)
            .ok_or_else(|| Error::validation_field("guests", "must be at least 1"))?;
        if guests > MAX_PARTY_SIZE {
            return Err(Error::validation_field(
                "guests",
                format!("must be at most {MAX_PARTY_SIZE}"),
            ));
        }

        let time = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
            .ok_or_else(|| Error::validation_field("time", "expected HH:MM"))?;
        let local = date.and_time(time);
        let at = tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| Error::validation_field("time", "does not exist in local time"))?;

        Ok(ReservationRequest {
            name,
            phone,
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            at,
            guests,
        })
    }
}

/// Reservation row to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReservation {
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Linked customer.
    pub cliente_id: CustomerId,
    /// Booking name.
    pub nombre_cliente: String,
    /// Phone.
    pub telefono: String,
    /// Email.
    pub email: Option<String>,
    /// Party size.
    pub personas: u32,
    /// Booked time.
    pub fecha_hora_reserva: DateTime<Utc>,
    /// Initial state, always pending.
    pub estado: ReservationStatus,
    /// Origin.
    pub origen: String,
}

impl NewReservation {
    /// Pending panel reservation for a validated request.
    pub fn from_panel(restaurant: RestaurantId, customer: CustomerId, req: ReservationRequest) -> Self {
        Self {
            restaurante_id: restaurant,
            cliente_id: customer,
            nombre_cliente: req.name,
            telefono: req.phone,
            email: req.email,
            personas: req.guests,
            fecha_hora_reserva: req.at,
            estado: ReservationStatus::Pending,
            origen: ORIGIN_PANEL.to_string(),
        }
    }
}

/// Attendance form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceInput {
    /// Whether the party showed up.
    pub attended: bool,
    /// Amount spent, as typed (decimal comma accepted).
    #[serde(default)]
    pub spend: Option<String>,
}

// ============================================================================
// Listing
// ============================================================================

/// Quick filter of the reservations list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationFilter {
    /// Everything.
    #[default]
    #[serde(alias = "todas")]
    All,
    /// Booked for today.
    #[serde(alias = "hoy")]
    Today,
    /// Waiting for confirmation.
    #[serde(alias = "pendientes")]
    Pending,
}

impl ReservationFilter {
    /// Whether a reservation passes the filter on local date `today`.
    pub fn matches<Tz: TimeZone>(&self, r: &Reservation, today: NaiveDate, tz: &Tz) -> bool {
        match self {
            ReservationFilter::All => true,
            ReservationFilter::Today => r.local_date(tz) == today,
            ReservationFilter::Pending => r.estado == ReservationStatus::Pending,
        }
    }
}

/// Reservation enriched for the list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationListItem {
    /// The reservation.
    #[serde(flatten)]
    pub reservation: Reservation,
    /// Whether the linked customer already left a review.
    pub customer_reviewed: bool,
}

/// Reservations on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    /// Local date.
    pub date: NaiveDate,
    /// Reservations booked for that date.
    pub count: usize,
}

/// Reservations per local day over the seven days ending `today`.
pub fn weekly_counts<Tz: TimeZone>(
    reservations: &[Reservation],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<DayCount> {
    (0..7)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let count = reservations
                .iter()
                .filter(|r| r.local_date(tz) == date)
                .count();
            DayCount { date, count }
        })
        .collect()
}

/// Reservation counters for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationCounters {
    /// Non-cancelled reservations booked for today.
    pub today: usize,
    /// Reservations waiting for confirmation.
    pub pending: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use chrono_tz::Europe::Madrid;

    pub(crate) fn reservation(at: DateTime<Utc>, guests: u32, estado: ReservationStatus) -> Reservation {
        Reservation {
            id: ReservationId::new(),
            restaurante_id: RestaurantId::new(),
            cliente_id: None,
            nombre_cliente: Some("Ana García".into()),
            telefono: Some("600000000".into()),
            email: None,
            personas: Some(guests),
            fecha_hora_reserva: at,
            estado,
            atendida: None,
            resena_solicitada: false,
            origen: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Cancelled).unwrap(),
            "\"cancelada\""
        );
        let s: ReservationStatus = serde_json::from_str("\"confirmada\"").unwrap();
        assert_eq!(s, ReservationStatus::Confirmed);
        assert!(!ReservationStatus::Cancelled.is_active());
    }

    #[test]
    fn test_new_reservation_validation_converts_to_utc() {
        let req = NewReservationInput {
            name: " Ana ".into(),
            phone: "600111222".into(),
            email: Some("  ".into()),
            date: Some(date(2026, 7, 10)),
            time: "21:30".into(),
            guests: Some(4),
        }
        .validate(&Madrid)
        .unwrap();
        assert_eq!(req.name, "Ana");
        assert_eq!(req.email, None);
        assert_eq!(req.at.to_rfc3339(), "2026-07-10T19:30:00+00:00");
    }

    #[test]
    fn test_new_reservation_requires_fields() {
        let base = NewReservationInput {
            name: "Ana".into(),
            phone: "600".into(),
            email: None,
            date: Some(date(2026, 7, 10)),
            time: "21:30".into(),
            guests: Some(2),
        };
        assert!(base.clone().validate(&Madrid).is_ok());
        for bad in [
            NewReservationInput {
                name: "".into(),
                ..base.clone()
            },
            NewReservationInput {
                phone: " ".into(),
                ..base.clone()
            },
            NewReservationInput {
                date: None,
                ..base.clone()
            },
            NewReservationInput {
                time: "25:00".into(),
                ..base.clone()
            },
            NewReservationInput {
                guests: Some(0),
                ..base.clone()
            },
            NewReservationInput {
                guests: Some(MAX_PARTY_SIZE + 1),
                ..base.clone()
            },
        ] {
            assert!(bad.validate(&Madrid).is_err());
        }
    }

    #[test]
    fn test_huge_party_rejected_on_guests_field() {
        let input = NewReservationInput {
            name: "Ana".into(),
            phone: "600".into(),
            email: None,
            date: Some(date(2026, 7, 10)),
            time: "21:30".into(),
            guests: Some(3_000_000_000),
        };
        let err = input.clone().validate(&Madrid).unwrap_err();
        assert!(matches!(err, Error::Validation { field: Some(ref f), .. } if f == "guests"));

        let at_limit = NewReservationInput {
            guests: Some(MAX_PARTY_SIZE),
            ..input
        };
        assert_eq!(at_limit.validate(&Madrid).unwrap().guests, MAX_PARTY_SIZE);
    }

    #[test]
    fn test_filters() {
        let today = date(2026, 10, 16);
        let tz = Madrid;
        let at_today = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let at_tomorrow = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let a = reservation(at_today, 2, ReservationStatus::Confirmed);
        let b = reservation(at_tomorrow, 2, ReservationStatus::Pending);

        assert!(ReservationFilter::All.matches(&b, today, &tz));
        assert!(ReservationFilter::Today.matches(&a, today, &tz));
        assert!(!ReservationFilter::Today.matches(&b, today, &tz));
        assert!(ReservationFilter::Pending.matches(&b, today, &tz));
        assert!(!ReservationFilter::Pending.matches(&a, today, &tz));
    }

    #[test]
    fn test_filter_accepts_spanish_aliases() {
        let f: ReservationFilter = serde_json::from_str("\"hoy\"").unwrap();
        assert_eq!(f, ReservationFilter::Today);
        let f: ReservationFilter = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(f, ReservationFilter::Pending);
    }

    #[test]
    fn test_name_search_is_case_insensitive() {
        let r = reservation(Utc::now(), 2, ReservationStatus::Pending);
        assert!(r.matches_name("garcía"));
        assert!(r.matches_name("ANA"));
        assert!(r.matches_name(""));
        assert!(!r.matches_name("pedro"));
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        // 23:30 UTC on the 16th is 01:30 on the 17th in Madrid summer time
        let at = Utc.with_ymd_and_hms(2026, 7, 16, 23, 30, 0).unwrap();
        let r = reservation(at, 2, ReservationStatus::Pending);
        assert_eq!(r.local_date(&Madrid), date(2026, 7, 17));
        assert_eq!(r.local_minute(&Madrid), 90);
    }

    #[test]
    fn test_weekly_counts() {
        let today = date(2026, 10, 16);
        let rs = vec![
            reservation(
                Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap(),
                2,
                ReservationStatus::Cancelled,
            ),
            reservation(
                Utc.with_ymd_and_hms(2026, 10, 10, 12, 0, 0).unwrap(),
                2,
                ReservationStatus::Pending,
            ),
            reservation(
                Utc.with_ymd_and_hms(2026, 10, 9, 12, 0, 0).unwrap(),
                2,
                ReservationStatus::Pending,
            ),
        ];
        let week = weekly_counts(&rs, today, &Madrid);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, date(2026, 10, 10));
        assert_eq!(week[0].count, 1);
        assert_eq!(week[6].date, today);
        assert_eq!(week[6].count, 1);
        assert_eq!(week.iter().map(|d| d.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_local_day_bounds() {
        let (start, end) = local_day_bounds(date(2026, 1, 15), &Madrid);
        assert_eq!(start.to_rfc3339(), "2026-01-14T23:00:00+00:00");
        assert!(end > start);
        assert_eq!((end - start).num_hours(), 23);
    }
}
