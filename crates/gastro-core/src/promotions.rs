//! Automatic promotions (coupons) and their eligibility rules.
//!
//! A coupon's `condiciones` column is a JSON object tagged by `tipo`. Two
//! kinds are evaluated for customers: birthday offers and off-peak ("horas
//! valle") offers. Other kinds are stored and listed but never evaluated.

use crate::error::{Error, Result};
use crate::ids::{CouponId, RestaurantId};
use crate::schedule::parse_hhmm;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default start of the off-peak window.
pub const DEFAULT_OFF_PEAK_START: &str = "20:00";
/// Default end of the off-peak window.
pub const DEFAULT_OFF_PEAK_END: &str = "21:00";

fn one() -> u32 {
    1
}

fn default_start() -> String {
    DEFAULT_OFF_PEAK_START.to_string()
}

fn default_end() -> String {
    DEFAULT_OFF_PEAK_END.to_string()
}

/// Conditions attached to a coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum CouponConditions {
    /// Offered around the customer's birthday.
    #[serde(rename = "cumpleanos")]
    Birthday {
        /// Days the offer stays valid from the birthday on.
        #[serde(default = "one")]
        validez_dias: u32,
        /// Days before the birthday the offer opens.
        #[serde(default)]
        dias_antes: u32,
    },
    /// Offered on quiet days and hours.
    #[serde(rename = "horas_valle")]
    OffPeak {
        /// Weekdays, Monday = 0. Empty means every day.
        #[serde(default)]
        dias_semana: Vec<u8>,
        /// Window start, `"HH:MM"`.
        #[serde(default = "default_start")]
        hora_inicio: String,
        /// Window end, `"HH:MM"`; may be earlier than the start to wrap midnight.
        #[serde(default = "default_end")]
        hora_fin: String,
        /// Offer repeats every N visits.
        #[serde(default = "one")]
        cada_x_visitas: u32,
    },
    /// Any other kind; kept as is and never evaluated.
    #[serde(other)]
    Other,
}

/// A coupon (`cupones` row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Coupon id.
    pub id: CouponId,
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Display name.
    pub nombre: String,
    /// Benefit text, e.g. "Postre gratis".
    pub beneficio: String,
    /// Tagged conditions.
    #[serde(default)]
    pub condiciones: Option<CouponConditions>,
    /// Whether the coupon is offered.
    #[serde(default)]
    pub activo: bool,
    /// Creation time.
    #[serde(default)]
    pub creado_en: Option<DateTime<Utc>>,
}

/// Coupon form as submitted by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponInput {
    /// Display name.
    pub name: String,
    /// Benefit text.
    pub benefit: String,
    /// Conditions.
    pub conditions: CouponConditions,
    /// Whether the coupon starts active.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Validated coupon fields ready for insert or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponDraft {
    /// Display name.
    pub nombre: String,
    /// Benefit text.
    pub beneficio: String,
    /// Normalised conditions.
    pub condiciones: CouponConditions,
    /// Active flag.
    pub activo: bool,
}

impl CouponInput {
    /// Validates the form and clamps numeric conditions.
    pub fn validate(self) -> Result<CouponDraft> {
        let nombre = self.name.trim().to_string();
        if nombre.is_empty() {
            return Err(Error::validation_field("name", "must not be empty"));
        }
        let beneficio = self.benefit.trim().to_string();
        if beneficio.is_empty() {
            return Err(Error::validation_field("benefit", "must not be empty"));
        }

        let condiciones = match self.conditions {
            CouponConditions::Birthday {
                validez_dias,
                dias_antes,
            } => CouponConditions::Birthday {
                validez_dias: validez_dias.max(1),
                dias_antes,
            },
            CouponConditions::OffPeak {
                mut dias_semana,
                hora_inicio,
                hora_fin,
                cada_x_visitas,
            } => {
                let start = hora_inicio.trim().to_string();
                let end = hora_fin.trim().to_string();
                if parse_hhmm(&start).is_none() || parse_hhmm(&end).is_none() {
                    return Err(Error::validation_field("hours", "start and end are required"));
                }
                dias_semana.retain(|d| *d < 7);
                dias_semana.sort_unstable();
                dias_semana.dedup();
                if dias_semana.is_empty() {
                    return Err(Error::validation_field("days", "select at least one day"));
                }
                CouponConditions::OffPeak {
                    dias_semana,
                    hora_inicio: start,
                    hora_fin: end,
                    cada_x_visitas: cada_x_visitas.max(1),
                }
            }
            CouponConditions::Other => {
                return Err(Error::validation_field("conditions", "unsupported coupon type"));
            }
        };

        Ok(CouponDraft {
            nombre,
            beneficio,
            condiciones,
            activo: self.active,
        })
    }
}

// ============================================================================
// Eligibility
// ============================================================================

/// Why a promotion is or is not available right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EligibilityReason {
    /// Birthday offer open today.
    Available,
    /// Birthday offer opens in `days` days.
    AvailableIn {
        /// Days until the window opens.
        days: i64,
    },
    /// Birthday window already closed for this year.
    OutsideWindow,
    /// Customer has no birth date on file.
    NoBirthDate,
    /// Off-peak offer open at this moment.
    AvailableNow,
    /// Off-peak offer applies today but not at this time.
    Hours {
        /// Window start.
        start: String,
        /// Window end.
        end: String,
    },
    /// Off-peak offer does not apply today.
    NotToday,
}

impl fmt::Display for EligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EligibilityReason::Available => write!(f, "Available"),
            EligibilityReason::AvailableIn { days } => write!(f, "Available in {days} days"),
            EligibilityReason::OutsideWindow => write!(f, "Outside window"),
            EligibilityReason::NoBirthDate => write!(f, "No birth date"),
            EligibilityReason::AvailableNow => write!(f, "Available now"),
            EligibilityReason::Hours { start, end } => write!(f, "Hours: {start}–{end}"),
            EligibilityReason::NotToday => write!(f, "Not today"),
        }
    }
}

/// Outcome of evaluating a promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// Whether the customer can use it now.
    pub available: bool,
    /// Explanation.
    pub reason: EligibilityReason,
}

impl Eligibility {
    fn new(available: bool, reason: EligibilityReason) -> Self {
        Self { available, reason }
    }
}

/// Birthday in `year`, moving 29 February to 1 March in common years.
fn birthday_in(year: i32, birth: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birth.month(), birth.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// Evaluates a birthday offer on the restaurant's local date `today`.
///
/// The window runs from `days_before` days before the next birthday (today
/// included) to `validity_days - 1` days after it.
pub fn birthday_eligibility(
    birth_date: Option<NaiveDate>,
    days_before: u32,
    validity_days: u32,
    today: NaiveDate,
) -> Eligibility {
    let Some(birth) = birth_date else {
        return Eligibility::new(false, EligibilityReason::NoBirthDate);
    };
    let Some(mut next) = birthday_in(today.year(), birth) else {
        return Eligibility::new(false, EligibilityReason::OutsideWindow);
    };
    if next < today {
        match birthday_in(today.year() + 1, birth) {
            Some(d) => next = d,
            None => return Eligibility::new(false, EligibilityReason::OutsideWindow),
        }
    }

    let start = next - Duration::days(i64::from(days_before));
    let end = next + Duration::days(i64::from(validity_days)) - Duration::days(1);

    if today >= start && today <= end {
        return Eligibility::new(true, EligibilityReason::Available);
    }
    let days_to_start = (start - today).num_days();
    if days_to_start > 0 {
        Eligibility::new(false, EligibilityReason::AvailableIn { days: days_to_start })
    } else {
        Eligibility::new(false, EligibilityReason::OutsideWindow)
    }
}

/// Whether `now` lies in `[start, end]`, wrapping past midnight when
/// `start > end`.
pub fn within_window(now: u32, start: u32, end: u32) -> bool {
    if start <= end {
        now >= start && now <= end
    } else {
        now >= start || now <= end
    }
}

/// Evaluates an off-peak offer at a local weekday (Monday = 0) and minute.
pub fn off_peak_eligibility(
    weekdays: &[u8],
    start: &str,
    end: &str,
    weekday_mon0: u8,
    now_minute: u32,
) -> Eligibility {
    let day_ok = weekdays.is_empty() || weekdays.contains(&weekday_mon0);
    if !day_ok {
        return Eligibility::new(false, EligibilityReason::NotToday);
    }
    let start_min = parse_hhmm(start).unwrap_or(0);
    let end_min = parse_hhmm(end).unwrap_or(0);
    if within_window(now_minute, start_min, end_min) {
        Eligibility::new(true, EligibilityReason::AvailableNow)
    } else {
        Eligibility::new(
            false,
            EligibilityReason::Hours {
                start: start.to_string(),
                end: end.to_string(),
            },
        )
    }
}

impl Coupon {
    /// Evaluates the coupon for a customer at local time `now`.
    ///
    /// Returns `None` for coupons whose kind is not evaluated.
    pub fn eligibility(&self, birth_date: Option<NaiveDate>, now: NaiveDateTime) -> Option<Eligibility> {
        match self.condiciones.as_ref()? {
            CouponConditions::Birthday {
                validez_dias,
                dias_antes,
            } => Some(birthday_eligibility(
                birth_date,
                *dias_antes,
                *validez_dias,
                now.date(),
            )),
            CouponConditions::OffPeak {
                dias_semana,
                hora_inicio,
                hora_fin,
                ..
            } => {
                let weekday = now.weekday().num_days_from_monday() as u8;
                let minute = now.hour() * 60 + now.minute();
                Some(off_peak_eligibility(
                    dias_semana,
                    hora_inicio,
                    hora_fin,
                    weekday,
                    minute,
                ))
            }
            CouponConditions::Other => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_conditions_deserialize_with_defaults() {
        let c: CouponConditions = serde_json::from_value(json!({"tipo": "horas_valle"})).unwrap();
        assert_eq!(
            c,
            CouponConditions::OffPeak {
                dias_semana: vec![],
                hora_inicio: "20:00".into(),
                hora_fin: "21:00".into(),
                cada_x_visitas: 1,
            }
        );
        let c: CouponConditions =
            serde_json::from_value(json!({"tipo": "cumpleanos", "dias_antes": 3})).unwrap();
        assert_eq!(
            c,
            CouponConditions::Birthday {
                validez_dias: 1,
                dias_antes: 3
            }
        );
        let c: CouponConditions = serde_json::from_value(json!({"tipo": "2x1"})).unwrap();
        assert_eq!(c, CouponConditions::Other);
    }

    #[test]
    fn test_conditions_serialize_tagged() {
        let v = serde_json::to_value(CouponConditions::Birthday {
            validez_dias: 7,
            dias_antes: 2,
        })
        .unwrap();
        assert_eq!(v, json!({"tipo": "cumpleanos", "validez_dias": 7, "dias_antes": 2}));
    }

    #[test]
    fn test_coupon_input_validation() {
        let ok = CouponInput {
            name: " Cumple ".into(),
            benefit: "Postre".into(),
            conditions: CouponConditions::Birthday {
                validez_dias: 0,
                dias_antes: 0,
            },
            active: true,
        }
        .validate()
        .unwrap();
        assert_eq!(ok.nombre, "Cumple");
        assert_eq!(
            ok.condiciones,
            CouponConditions::Birthday {
                validez_dias: 1,
                dias_antes: 0
            }
        );

        let missing_benefit = CouponInput {
            name: "X".into(),
            benefit: " ".into(),
            conditions: CouponConditions::Other,
            active: true,
        };
        assert!(missing_benefit.validate().is_err());
    }

    #[test]
    fn test_off_peak_requires_days_and_hours() {
        let input = |days: Vec<u8>, start: &str| CouponInput {
            name: "Valle".into(),
            benefit: "10%".into(),
            conditions: CouponConditions::OffPeak {
                dias_semana: days,
                hora_inicio: start.into(),
                hora_fin: "18:00".into(),
                cada_x_visitas: 0,
            },
            active: true,
        };
        assert!(input(vec![], "16:00").validate().is_err());
        assert!(input(vec![1], "").validate().is_err());
        let draft = input(vec![3, 1, 1, 9], "16:00").validate().unwrap();
        let CouponConditions::OffPeak {
            dias_semana,
            cada_x_visitas,
            ..
        } = draft.condiciones
        else {
            unreachable!("expected off-peak conditions");
        };
        assert_eq!(dias_semana, vec![1, 3]);
        assert_eq!(cada_x_visitas, 1);
    }

    #[test]
    fn test_birthday_inside_window() {
        let e = birthday_eligibility(Some(date(1990, 10, 20)), 5, 3, date(2026, 10, 16));
        assert!(e.available);
        assert_eq!(e.reason, EligibilityReason::Available);

        // last valid day: birthday + validity - 1
        let e = birthday_eligibility(Some(date(1990, 10, 20)), 0, 3, date(2026, 10, 22));
        assert!(e.available);
    }

    #[test]
    fn test_birthday_upcoming() {
        let e = birthday_eligibility(Some(date(1990, 10, 30)), 2, 1, date(2026, 10, 16));
        assert!(!e.available);
        assert_eq!(e.reason, EligibilityReason::AvailableIn { days: 12 });
    }

    #[test]
    fn test_birthday_passed_rolls_to_next_year() {
        // Birthday was yesterday with one-day validity: next one is a year away.
        let e = birthday_eligibility(Some(date(1990, 10, 15)), 0, 1, date(2026, 10, 16));
        assert!(!e.available);
        assert!(matches!(e.reason, EligibilityReason::AvailableIn { days } if days > 300));
    }

    #[test]
    fn test_birthday_no_date() {
        let e = birthday_eligibility(None, 0, 1, date(2026, 10, 16));
        assert_eq!(e.reason, EligibilityReason::NoBirthDate);
    }

    #[test]
    fn test_birthday_leap_day() {
        let e = birthday_eligibility(Some(date(2000, 2, 29)), 0, 1, date(2027, 3, 1));
        assert!(e.available);
    }

    #[test]
    fn test_within_window_wraps() {
        assert!(within_window(23 * 60, 22 * 60, 60));
        assert!(within_window(30, 22 * 60, 60));
        assert!(!within_window(12 * 60, 22 * 60, 60));
        assert!(within_window(18 * 60, 16 * 60, 18 * 60));
    }

    #[test]
    fn test_off_peak_eligibility() {
        let e = off_peak_eligibility(&[0, 1], "16:00", "18:00", 1, 17 * 60);
        assert_eq!(e.reason, EligibilityReason::AvailableNow);
        assert!(e.available);

        let e = off_peak_eligibility(&[0, 1], "16:00", "18:00", 1, 19 * 60);
        assert!(!e.available);
        assert_eq!(e.reason.to_string(), "Hours: 16:00–18:00");

        let e = off_peak_eligibility(&[0, 1], "16:00", "18:00", 4, 17 * 60);
        assert_eq!(e.reason, EligibilityReason::NotToday);

        let e = off_peak_eligibility(&[], "16:00", "18:00", 6, 17 * 60);
        assert!(e.available);
    }

    #[test]
    fn test_coupon_eligibility_uses_local_time() {
        let coupon = Coupon {
            id: CouponId::new(),
            restaurante_id: RestaurantId::new(),
            nombre: "Valle".into(),
            beneficio: "10%".into(),
            condiciones: Some(CouponConditions::OffPeak {
                dias_semana: vec![4],
                hora_inicio: "16:00".into(),
                hora_fin: "18:00".into(),
                cada_x_visitas: 1,
            }),
            activo: true,
            creado_en: None,
        };
        // 2026-10-16 is a Friday (Monday = 0 -> 4)
        let now = date(2026, 10, 16).and_hms_opt(17, 0, 0).unwrap();
        assert!(coupon.eligibility(None, now).unwrap().available);

        let other = Coupon {
            condiciones: Some(CouponConditions::Other),
            ..coupon
        };
        assert!(other.eligibility(None, now).is_none());
    }
}
