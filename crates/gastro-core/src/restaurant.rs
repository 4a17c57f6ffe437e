//! Restaurant tenant record and its settings.

use crate::error::{Error, Result};
use crate::ids::RestaurantId;
use crate::loyalty::{PointsConfig, normalize_points_per_euro};
use crate::occupancy::CapacityPlan;
use crate::schedule::{Service, ServiceWindow};
use serde::{Deserialize, Serialize};

/// Accent colour used on the public rewards page when none is configured.
pub const DEFAULT_ACCENT: &str = "#2563eb";

/// Background colour used on the public rewards page when none is configured.
pub const DEFAULT_BACKGROUND: &str = "#f8fafc";

/// One restaurant account (`restaurantes` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Tenant identifier.
    pub id: RestaurantId,
    /// Display name.
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    /// Contact phone.
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    /// Total seats.
    #[serde(rename = "capacidad_total", default)]
    pub total_capacity: Option<u32>,
    /// Seats available per lunch slot.
    #[serde(rename = "capacidad_comida", default)]
    pub lunch_capacity: Option<u32>,
    /// Seats available per dinner slot.
    #[serde(rename = "capacidad_cena", default)]
    pub dinner_capacity: Option<u32>,
    /// Lunch schedule text, e.g. `"13:00-16:00"`.
    #[serde(rename = "horario_comida", default)]
    pub lunch_schedule: Option<String>,
    /// Dinner schedule text.
    #[serde(rename = "horario_cena", default)]
    pub dinner_schedule: Option<String>,
    /// Whether the loyalty programme is switched on.
    #[serde(rename = "puntos_activo", default)]
    pub points_enabled: Option<bool>,
    /// Points credited per euro spent.
    #[serde(rename = "puntos_por_euro", default)]
    pub points_per_euro: Option<f64>,
    /// Brand accent colour.
    #[serde(rename = "color_primario", default)]
    pub accent_color: Option<String>,
    /// Brand background colour.
    #[serde(rename = "color_fondo", default)]
    pub background_color: Option<String>,
    /// Logo URL.
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl Restaurant {
    /// Creates a restaurant with nothing configured but its name.
    pub fn new(id: RestaurantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            phone: None,
            total_capacity: None,
            lunch_capacity: None,
            dinner_capacity: None,
            lunch_schedule: None,
            dinner_schedule: None,
            points_enabled: None,
            points_per_euro: None,
            accent_color: None,
            background_color: None,
            logo_url: None,
        }
    }

    /// Lunch window, defaulting when the schedule is missing or malformed.
    pub fn lunch_window(&self) -> ServiceWindow {
        ServiceWindow::resolve(self.lunch_schedule.as_deref(), Service::Lunch)
    }

    /// Dinner window, defaulting when the schedule is missing or malformed.
    pub fn dinner_window(&self) -> ServiceWindow {
        ServiceWindow::resolve(self.dinner_schedule.as_deref(), Service::Dinner)
    }

    /// Windows and capacities used by the occupancy estimator.
    pub fn capacity_plan(&self) -> CapacityPlan {
        CapacityPlan {
            lunch: self.lunch_window(),
            dinner: self.dinner_window(),
            lunch_capacity: self.lunch_capacity.unwrap_or(0),
            dinner_capacity: self.dinner_capacity.unwrap_or(0),
        }
    }

    /// Loyalty settings of the restaurant.
    ///
    /// The programme is on only when the `puntos_activo` flag is set and the
    /// stored ratio is positive.
    pub fn points_config(&self) -> PointsConfig {
        let ratio = self.points_per_euro.unwrap_or(0.0);
        PointsConfig {
            enabled: self.points_enabled.unwrap_or(false) && ratio.is_finite() && ratio > 0.0,
            points_per_euro: normalize_points_per_euro(ratio),
        }
    }

    /// Public branding with defaults applied.
    pub fn branding(&self) -> Branding {
        Branding {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| "Restaurante".to_string()),
            accent: self
                .accent_color
                .clone()
                .unwrap_or_else(|| DEFAULT_ACCENT.to_string()),
            background: self
                .background_color
                .clone()
                .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()),
            logo_url: self.logo_url.clone(),
        }
    }
}

/// Branding shown on the customer-facing rewards page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branding {
    /// Restaurant display name.
    pub name: String,
    /// Accent colour.
    pub accent: String,
    /// Background colour.
    pub background: String,
    /// Logo URL, if any.
    pub logo_url: Option<String>,
}

/// Editable restaurant settings as submitted from the settings page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsInput {
    /// Display name.
    pub name: String,
    /// Contact phone.
    #[serde(default)]
    pub phone: String,
    /// Total seats.
    #[serde(default)]
    pub total_capacity: u32,
    /// Lunch schedule text.
    #[serde(default)]
    pub lunch_schedule: String,
    /// Dinner schedule text.
    #[serde(default)]
    pub dinner_schedule: String,
    /// Seats per lunch slot.
    #[serde(default)]
    pub lunch_capacity: u32,
    /// Seats per dinner slot.
    #[serde(default)]
    pub dinner_capacity: u32,
    /// Loyalty programme switch.
    #[serde(default)]
    pub points_enabled: bool,
    /// Ratio as typed by the user; a decimal comma is accepted.
    #[serde(default)]
    pub points_per_euro: String,
}

/// Settings ready to be written to the `restaurantes` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    /// Display name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Contact phone.
    #[serde(rename = "telefono")]
    pub phone: String,
    /// Total seats.
    #[serde(rename = "capacidad_total")]
    pub total_capacity: u32,
    /// Lunch schedule text.
    #[serde(rename = "horario_comida")]
    pub lunch_schedule: String,
    /// Dinner schedule text.
    #[serde(rename = "horario_cena")]
    pub dinner_schedule: String,
    /// Seats per lunch slot.
    #[serde(rename = "capacidad_comida")]
    pub lunch_capacity: u32,
    /// Seats per dinner slot.
    #[serde(rename = "capacidad_cena")]
    pub dinner_capacity: u32,
    /// Loyalty programme switch.
    #[serde(rename = "puntos_activo")]
    pub points_enabled: bool,
    /// Normalised points-per-euro ratio (always > 0).
    #[serde(rename = "puntos_por_euro")]
    pub points_per_euro: f64,
}

impl SettingsInput {
    /// Validates the form and normalises the points ratio.
    ///
    /// Schedules are stored as typed, but a non-empty schedule that cannot
    /// be parsed is rejected so the occupancy page never silently falls
    /// back to defaults.
    pub fn into_update(self) -> Result<SettingsUpdate> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation_field("name", "must not be empty"));
        }
        for (field, text) in [
            ("lunch_schedule", &self.lunch_schedule),
            ("dinner_schedule", &self.dinner_schedule),
        ] {
            if !text.trim().is_empty() && crate::schedule::parse_window(text).is_none() {
                return Err(Error::validation_field(field, "expected HH:MM-HH:MM"));
            }
        }

        let ratio = self
            .points_per_euro
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .unwrap_or(1.0);

        Ok(SettingsUpdate {
            name,
            phone: self.phone.trim().to_string(),
            total_capacity: self.total_capacity,
            lunch_schedule: self.lunch_schedule.trim().to_string(),
            dinner_schedule: self.dinner_schedule.trim().to_string(),
            lunch_capacity: self.lunch_capacity,
            dinner_capacity: self.dinner_capacity,
            points_enabled: self.points_enabled,
            points_per_euro: normalize_points_per_euro(ratio),
        })
    }
}
