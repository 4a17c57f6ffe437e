//! Customer records (CRM) and visit history.

use crate::error::{Error, Result};
use crate::ids::{CustomerId, ReservationId, RestaurantId};
use crate::reservations::MAX_PARTY_SIZE;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Procedure bumping a customer's visit counter.
pub const PROC_INCREMENT_VISIT: &str = "increment_client_visit";

/// History row kind for a visit.
pub const VISIT_KIND: &str = "visita";

/// Contact channel of customers created from the panel.
pub const CHANNEL_PANEL: &str = "panel";

/// A customer (`clientes` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer id.
    pub id: CustomerId,
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Display name.
    #[serde(default)]
    pub nombre: Option<String>,
    /// Name used for duplicate detection, see [`normalize_name`].
    #[serde(default)]
    pub nombre_normalizado: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub telefono: Option<String>,
    /// Visit counter.
    #[serde(default)]
    pub visitas_totales: i64,
    /// Most recent visit.
    #[serde(default)]
    pub ultima_visita: Option<DateTime<Utc>>,
    /// How the customer was first recorded.
    #[serde(default)]
    pub canal_contacto: Option<String>,
    /// Birth date, used by birthday offers.
    #[serde(default)]
    pub fecha_nacimiento: Option<NaiveDate>,
    /// Token of the public rewards page.
    #[serde(default)]
    pub public_token: Option<String>,
    /// Whether the customer already left a review.
    #[serde(default)]
    pub ya_dejo_resena: bool,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// Loyalty tier from the visit counter.
    pub fn tier(&self) -> CustomerTier {
        CustomerTier::from_visits(self.visitas_totales)
    }
}

/// Fields of a customer to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Display name.
    pub nombre: String,
    /// Normalised name.
    pub nombre_normalizado: String,
    /// Phone number.
    pub telefono: Option<String>,
    /// Initial visit counter.
    pub visitas_totales: i64,
    /// Initial last visit.
    pub ultima_visita: Option<DateTime<Utc>>,
    /// Contact channel.
    pub canal_contacto: Option<String>,
}

impl NewCustomer {
    /// Customer created when a reservation is booked from the panel.
    pub fn from_panel(restaurant: RestaurantId, name: &str, phone: &str) -> Self {
        Self {
            restaurante_id: restaurant,
            nombre: name.trim().to_string(),
            nombre_normalizado: normalize_name(name),
            telefono: Some(phone.trim().to_string()),
            visitas_totales: 0,
            ultima_visita: None,
            canal_contacto: Some(CHANNEL_PANEL.to_string()),
        }
    }
}

/// Customer tier derived from visit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTier {
    /// Fewer than two visits.
    New,
    /// Two to four visits.
    Regular,
    /// Five or more visits.
    Frequent,
}

impl CustomerTier {
    /// Tier for a visit count.
    pub fn from_visits(visits: i64) -> Self {
        if visits >= 5 {
            CustomerTier::Frequent
        } else if visits >= 2 {
            CustomerTier::Regular
        } else {
            CustomerTier::New
        }
    }
}

/// Lowercases, strips diacritics and collapses whitespace.
///
/// `"  José   Ñúñez "` becomes `"jose nunez"`.
pub fn normalize_name(name: &str) -> String {
    let stripped: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Visit history
// ============================================================================

/// A visit in the customer's history (`clientes_historial` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Customer.
    pub cliente_id: CustomerId,
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Reservation the visit came from; unique when present.
    #[serde(default)]
    pub reserva_id: Option<ReservationId>,
    /// Row kind, always [`VISIT_KIND`] for visits.
    pub tipo: String,
    /// Party size.
    #[serde(default)]
    pub personas: Option<u32>,
    /// Amount spent in euros.
    #[serde(default)]
    pub gasto_eur: Option<f64>,
    /// When the visit happened.
    pub created_at: DateTime<Utc>,
}

impl VisitRecord {
    /// A visit row.
    pub fn visit(
        customer: CustomerId,
        restaurant: RestaurantId,
        at: DateTime<Utc>,
        guests: Option<u32>,
    ) -> Self {
        Self {
            cliente_id: customer,
            restaurante_id: restaurant,
            reserva_id: None,
            tipo: VISIT_KIND.to_string(),
            personas: guests,
            gasto_eur: None,
            created_at: at,
        }
    }
}

/// Noon of a local calendar date, as UTC.
///
/// Visits entered by date only are pinned to midday so they land on the
/// same calendar day in any nearby time zone.
pub fn local_noon<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN));
    tz.from_local_datetime(&noon)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&noon))
}

// ============================================================================
// Forms
// ============================================================================

/// Walk-in registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkInInput {
    /// Customer name.
    #[serde(default)]
    pub name: String,
    /// Date of the visit.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Party size.
    #[serde(default)]
    pub guests: Option<u32>,
}

/// A validated walk-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkIn {
    /// Trimmed name.
    pub name: String,
    /// Normalised name.
    pub normalized: String,
    /// Date of the visit.
    pub date: NaiveDate,
    /// Party size (zero treated as unknown).
    pub guests: Option<u32>,
}

impl WalkInInput {
    /// Validates the form: name and date are required.
    pub fn validate(self) -> Result<WalkIn> {
        let name = self.name.trim().to_string();
        let normalized = normalize_name(&name);
        if normalized.is_empty() {
            return Err(Error::validation_field("name", "must not be empty"));
        }
        let date = self
            .date
            .ok_or_else(|| Error::validation_field("date", "is required"))?;
        if self.guests.is_some_and(|g| g > MAX_PARTY_SIZE) {
            return Err(Error::validation_field(
                "guests",
                format!("must be at most {MAX_PARTY_SIZE}"),
            ));
        }
        Ok(WalkIn {
            name,
            normalized,
            date,
            guests: self.guests.filter(|g| *g > 0),
        })
    }
}

/// Visit added to an existing customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitInput {
    /// Date of the visit.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Party size.
    #[serde(default)]
    pub guests: Option<u32>,
}

// ============================================================================
// Listing
// ============================================================================

/// Customer counters shown above the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerTotals {
    /// All customers.
    pub total: usize,
    /// Customers with five or more visits.
    pub frequent: usize,
    /// Customers with exactly one visit.
    pub new: usize,
}

impl CustomerTotals {
    /// Counts a customer list.
    pub fn from_customers(customers: &[Customer]) -> Self {
        Self {
            total: customers.len(),
            frequent: customers
                .iter()
                .filter(|c| c.tier() == CustomerTier::Frequent)
                .count(),
            new: customers.iter().filter(|c| c.visitas_totales == 1).count(),
        }
    }
}
