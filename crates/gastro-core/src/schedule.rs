//! Service schedules.
//!
//! Restaurants store each service's opening hours as free text such as
//! `"13:00 - 16:00"`. This module turns that text into a [`ServiceWindow`]
//! measured in minutes since local midnight.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minutes in an hour; slots are one hour wide.
pub const SLOT_MINUTES: u32 = 60;

/// Default lunch window when the restaurant has no usable schedule.
pub const DEFAULT_LUNCH: ServiceWindow = ServiceWindow {
    start: 12 * 60,
    end: 16 * 60,
};

/// Default dinner window when the restaurant has no usable schedule.
pub const DEFAULT_DINNER: ServiceWindow = ServiceWindow {
    start: 19 * 60,
    end: 23 * 60 + 59,
};

/// A meal service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    /// Midday service (comida).
    #[serde(rename = "comida")]
    Lunch,
    /// Evening service (cena).
    #[serde(rename = "cena")]
    Dinner,
}

impl Service {
    /// The default window used when the configured schedule is missing.
    pub fn default_window(self) -> ServiceWindow {
        match self {
            Service::Lunch => DEFAULT_LUNCH,
            Service::Dinner => DEFAULT_DINNER,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Lunch => write!(f, "Lunch"),
            Service::Dinner => write!(f, "Dinner"),
        }
    }
}

/// Opening window of a service, in minutes since local midnight.
///
/// `end` may be smaller than `start` only in malformed data; such a window
/// simply produces no slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceWindow {
    /// First minute of the service.
    pub start: u32,
    /// Minute at which the service closes.
    pub end: u32,
}

impl ServiceWindow {
    /// Creates a window from start and end minutes.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Whether `minute` falls inside the window, both bounds included.
    pub fn contains_inclusive(&self, minute: u32) -> bool {
        minute >= self.start && minute <= self.end
    }

    /// Resolves a configured schedule, falling back to the service default.
    pub fn resolve(text: Option<&str>, service: Service) -> Self {
        text.and_then(parse_window)
            .unwrap_or_else(|| service.default_window())
    }
}

impl fmt::Display for ServiceWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            minutes_to_hhmm(self.start),
            minutes_to_hhmm(self.end)
        )
    }
}

/// Parses `"HH:MM"` into minutes since midnight.
///
/// Hours up to 24 are accepted so `"24:00"` can close a late service.
pub fn parse_hhmm(text: &str) -> Option<u32> {
    let (h, m) = text.trim().split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    if h > 24 || m >= 60 {
        return None;
    }
    Some(h * 60 + m)
}

/// Parses a `"HH:MM-HH:MM"` schedule.
///
/// Hyphen, en dash and em dash are all accepted as separators and any
/// whitespace around the parts is ignored.
pub fn parse_window(text: &str) -> Option<ServiceWindow> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return None;
    }
    let mut parts = cleaned.split(['-', '–', '—']).map(str::trim);
    let start = parse_hhmm(parts.next()?)?;
    let end = parse_hhmm(parts.next()?)?;
    Some(ServiceWindow { start, end })
}

/// Renders minutes as `"HH:MM"`.
pub fn minutes_to_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Renders the hour containing `minutes` as `"HH:00"`.
pub fn hour_label(minutes: u32) -> String {
    format!("{:02}:00", minutes / 60)
}
