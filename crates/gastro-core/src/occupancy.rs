//! Occupancy estimator.
//!
//! Buckets the day's active reservations into one-hour slots of each service
//! window and compares the headcount against the configured per-service
//! capacity. Everything is recomputed from scratch on every read.
//!
//! ```rust
//! use gastro_core::occupancy::{Booking, CapacityPlan, DayOccupancy};
//! use gastro_core::ServiceWindow;
//!
//! let plan = CapacityPlan {
//!     lunch: ServiceWindow::new(13 * 60, 14 * 60),
//!     dinner: ServiceWindow::new(21 * 60, 22 * 60),
//!     lunch_capacity: 50,
//!     dinner_capacity: 50,
//! };
//! let bookings = [Booking::new(13 * 60 + 30, 32), Booking::new(21 * 60, 46)];
//! let day = DayOccupancy::compute(&plan, &bookings, None);
//! assert_eq!(day.lunch.average_pct, 64);
//! assert_eq!(day.dinner.average_pct, 92);
//! assert_eq!(day.total_pct, 78);
//! ```

use crate::schedule::{SLOT_MINUTES, Service, ServiceWindow, hour_label};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Occupancy below which a day counts as slack.
pub const DEFAULT_SLACK_THRESHOLD: u32 = 40;

/// Headline values above this are clamped.
pub const HEADLINE_CAP: u32 = 999;

// ============================================================================
// Inputs
// ============================================================================

/// Service windows and the seats available in each slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPlan {
    /// Lunch window.
    pub lunch: ServiceWindow,
    /// Dinner window.
    pub dinner: ServiceWindow,
    /// Seats per lunch slot (0 means "not configured").
    pub lunch_capacity: u32,
    /// Seats per dinner slot (0 means "not configured").
    pub dinner_capacity: u32,
}

impl CapacityPlan {
    fn window(&self, service: Service) -> ServiceWindow {
        match service {
            Service::Lunch => self.lunch,
            Service::Dinner => self.dinner,
        }
    }

    fn capacity(&self, service: Service) -> u32 {
        match service {
            Service::Lunch => self.lunch_capacity,
            Service::Dinner => self.dinner_capacity,
        }
    }
}

/// A non-cancelled reservation reduced to what the estimator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Local minute of day of the reservation.
    pub minute: u32,
    /// Party size.
    pub guests: u32,
}

impl Booking {
    /// Creates a booking at a local minute of day.
    pub fn new(minute: u32, guests: u32) -> Self {
        Self { minute, guests }
    }

    /// Converts a reservation timestamp into the restaurant's local time.
    pub fn at<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz, guests: u32) -> Self {
        Self {
            minute: local_minute(at, tz),
            guests,
        }
    }
}

/// Minute of day of `at` in the given time zone.
pub fn local_minute<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> u32 {
    let local = at.with_timezone(tz);
    local.hour() * 60 + local.minute()
}

// ============================================================================
// Slots
// ============================================================================

/// One-hour bucket inside a service window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// First minute of the slot.
    pub start: u32,
    /// End minute (exclusive); the last slot is cut at the window end.
    pub end: u32,
    /// Guests whose reservation starts inside the slot.
    pub guests: u32,
    /// Rounded percentage of capacity.
    pub pct: u32,
}

impl Slot {
    /// Whether `minute` falls in `[start, end)`.
    pub fn contains(&self, minute: u32) -> bool {
        minute >= self.start && minute < self.end
    }

    /// `"HH:00 - HH:00"` label.
    pub fn label(&self) -> String {
        format!("{} - {}", hour_label(self.start), hour_label(self.end))
    }
}

/// Splits a window into one-hour slots starting at the window start.
pub fn hourly_slots(window: ServiceWindow) -> Vec<Slot> {
    (window.start..window.end)
        .step_by(SLOT_MINUTES as usize)
        .map(|start| Slot {
            start,
            end: (start + SLOT_MINUTES).min(window.end),
            guests: 0,
            pct: 0,
        })
        .collect()
}

fn fill(slots: &mut [Slot], bookings: &[Booking]) {
    for booking in bookings {
        for slot in slots.iter_mut() {
            if slot.contains(booking.minute) {
                slot.guests = slot.guests.saturating_add(booking.guests);
            }
        }
    }
}

/// Unrounded percentage of capacity; 0 when capacity is not configured.
pub fn raw_pct(guests: u32, capacity: u32) -> f64 {
    if capacity == 0 {
        0.0
    } else {
        f64::from(guests) / f64::from(capacity) * 100.0
    }
}

fn round_pct(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

// ============================================================================
// Day occupancy
// ============================================================================

/// Occupancy of one service for a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOccupancy {
    /// Which service.
    pub service: Service,
    /// Window the slots were generated from.
    pub window: ServiceWindow,
    /// Seats per slot.
    pub capacity: u32,
    /// Hourly breakdown.
    pub slots: Vec<Slot>,
    /// Rounded mean of slot percentages.
    pub average_pct: u32,
    /// Percentage of the slot containing "now", 0 outside the service.
    pub current_pct: u32,
}

impl ServiceOccupancy {
    fn compute(
        plan: &CapacityPlan,
        service: Service,
        bookings: &[Booking],
        now_minute: Option<u32>,
    ) -> Self {
        let window = plan.window(service);
        let capacity = plan.capacity(service);
        let mut slots = hourly_slots(window);
        fill(&mut slots, bookings);
        for slot in &mut slots {
            slot.pct = round_pct(raw_pct(slot.guests, capacity));
        }

        let pcts: Vec<f64> = slots.iter().map(|s| f64::from(s.pct)).collect();
        let average_pct = round_pct(mean(&pcts));
        let current_pct = now_minute
            .and_then(|now| slots.iter().find(|s| s.contains(now)))
            .map(|s| s.pct)
            .unwrap_or(0);

        Self {
            service,
            window,
            capacity,
            slots,
            average_pct,
            current_pct,
        }
    }

    /// Slot labels in order.
    pub fn hours(&self) -> Vec<String> {
        self.slots.iter().map(Slot::label).collect()
    }

    /// Highest slot percentage (0 without slots).
    pub fn peak_pct(&self) -> u32 {
        self.slots.iter().map(|s| s.pct).max().unwrap_or(0)
    }
}

/// Occupancy for a whole day: both services plus the day average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOccupancy {
    /// Lunch breakdown.
    pub lunch: ServiceOccupancy,
    /// Dinner breakdown.
    pub dinner: ServiceOccupancy,
    /// Rounded mean over every slot of both services.
    pub total_pct: u32,
}

impl DayOccupancy {
    /// Computes today's occupancy. `now_minute` selects the current slot.
    pub fn compute(plan: &CapacityPlan, bookings: &[Booking], now_minute: Option<u32>) -> Self {
        let lunch = ServiceOccupancy::compute(plan, Service::Lunch, bookings, now_minute);
        let dinner = ServiceOccupancy::compute(plan, Service::Dinner, bookings, now_minute);
        let pcts: Vec<f64> = lunch
            .slots
            .iter()
            .chain(dinner.slots.iter())
            .map(|s| f64::from(s.pct))
            .collect();
        let total_pct = round_pct(mean(&pcts));
        Self {
            lunch,
            dinner,
            total_pct,
        }
    }
}

/// Day average for planning days ahead.
///
/// Unlike [`DayOccupancy::compute`] the slot percentages are averaged
/// unrounded and only the final figure is rounded.
pub fn day_total_pct(plan: &CapacityPlan, bookings: &[Booking]) -> u32 {
    let mut values = Vec::new();
    for service in [Service::Lunch, Service::Dinner] {
        let capacity = plan.capacity(service);
        let mut slots = hourly_slots(plan.window(service));
        fill(&mut slots, bookings);
        values.extend(slots.iter().map(|s| raw_pct(s.guests, capacity)));
    }
    round_pct(mean(&values))
}

// ============================================================================
// Headline figure
// ============================================================================

/// The single occupancy figure shown on the dashboard card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    /// Clamped percentage.
    pub pct: u32,
    /// Service the figure refers to.
    pub service: Service,
    /// That service's window.
    pub window: ServiceWindow,
}

impl Headline {
    /// `"Lunch · 13:00 - 16:00"`.
    pub fn context(&self) -> String {
        format!("{} · {}", self.service, self.window)
    }
}

/// Whole-service headcount against capacity for the service in progress.
///
/// Window bounds are inclusive here. Outside both services the busier one
/// is reported, dinner winning ties.
pub fn current_headline(plan: &CapacityPlan, bookings: &[Booking], now_minute: u32) -> Headline {
    let pct_for = |service: Service| {
        let window = plan.window(service);
        let guests = bookings
            .iter()
            .filter(|b| window.contains_inclusive(b.minute))
            .fold(0u32, |acc, b| acc.saturating_add(b.guests));
        round_pct(raw_pct(guests, plan.capacity(service)))
    };

    let lunch = pct_for(Service::Lunch);
    let dinner = pct_for(Service::Dinner);

    let (service, pct) = if plan.lunch.contains_inclusive(now_minute) {
        (Service::Lunch, lunch)
    } else if plan.dinner.contains_inclusive(now_minute) {
        (Service::Dinner, dinner)
    } else if dinner >= lunch {
        (Service::Dinner, dinner)
    } else {
        (Service::Lunch, lunch)
    };

    Headline {
        pct: pct.min(HEADLINE_CAP),
        service,
        window: plan.window(service),
    }
}

// ============================================================================
// Slack day of the week
// ============================================================================

/// Occupancy figure for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLoad {
    /// Calendar date.
    pub date: NaiveDate,
    /// Day average from [`day_total_pct`].
    pub occupancy: u32,
}

impl DayLoad {
    /// English weekday name.
    pub fn weekday_name(&self) -> String {
        self.date.format("%A").to_string()
    }
}

/// Monday-to-Sunday dates of `today`'s week, skipping days already past.
pub fn remaining_week(today: NaiveDate) -> Vec<NaiveDate> {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (0..7)
        .map(|i| monday + Duration::days(i))
        .filter(|d| *d >= today)
        .collect()
}

/// Emptiest day below `threshold`, earliest on ties.
pub fn slack_day(days: &[DayLoad], threshold: u32) -> Option<DayLoad> {
    days.iter()
        .filter(|d| d.occupancy < threshold)
        .min_by_key(|d| d.occupancy)
        .cloned()
}
