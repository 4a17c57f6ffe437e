//! Loyalty points: accrual arithmetic, reward catalogue and redemptions.
//!
//! The ledger itself lives in the hosted database. Balances are read from
//! the `puntos_saldos` view and every mutation of the balance goes through a
//! stored procedure, so this module only holds the records and the small
//! amount of arithmetic done before and after those calls.

use crate::error::{Error, Result};
use crate::ids::{CustomerId, RedemptionId, RestaurantId, RewardId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Procedure crediting points for a spend.
pub const PROC_REGISTER_SPEND: &str = "rpc_registrar_gasto";
/// Procedure creating a pending redemption and debiting the balance.
pub const PROC_REDEEM: &str = "rpc_canjear_premio";
/// Procedure confirming a pending redemption.
pub const PROC_CONFIRM_REDEMPTION: &str = "rpc_confirmar_canje";
/// Procedure cancelling a pending redemption and refunding its points.
pub const PROC_CANCEL_REDEMPTION: &str = "rpc_cancelar_canje";

// ============================================================================
// Accrual
// ============================================================================

/// Points programme settings of a restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointsConfig {
    /// Whether visits earn points.
    pub enabled: bool,
    /// Points per euro spent, always positive.
    pub points_per_euro: f64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            points_per_euro: 1.0,
        }
    }
}

/// Replaces a non-finite or non-positive ratio by 1.
pub fn normalize_points_per_euro(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

/// Parses a spend amount typed by staff.
///
/// Accepts a decimal comma. Empty input, negative amounts and anything that
/// is not a finite number yield `None`.
pub fn parse_spend(input: &str) -> Option<f64> {
    let cleaned = input.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Points a spend would earn: `floor(spend * ratio)`, never negative.
pub fn points_for_spend(spend: Option<f64>, config: &PointsConfig) -> i64 {
    match spend {
        Some(amount) if config.enabled && amount.is_finite() && amount > 0.0 => {
            (amount * config.points_per_euro).floor().max(0.0) as i64
        }
        _ => 0,
    }
}

/// Current balance of a customer (`puntos_saldos` row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsBalance {
    /// Customer.
    pub cliente_id: CustomerId,
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Points available.
    #[serde(default)]
    pub puntos: i64,
}

// ============================================================================
// Reward catalogue
// ============================================================================

/// Entry of the points catalogue (`premios_puntos` row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    /// Reward id.
    pub id: RewardId,
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Display name.
    pub nombre: String,
    /// Optional description.
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Cost in points (at least 1).
    pub puntos_requeridos: i64,
    /// Picture URL.
    #[serde(default)]
    pub imagen_url: Option<String>,
    /// Whether customers may redeem it.
    #[serde(default)]
    pub activo: bool,
    /// Creation time.
    #[serde(default)]
    pub creado_en: Option<DateTime<Utc>>,
}

/// Reward form as submitted by staff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardInput {
    /// Display name.
    pub name: String,
    /// Optional description; blank means none.
    #[serde(default)]
    pub description: Option<String>,
    /// Requested cost; clamped to at least 1.
    #[serde(default)]
    pub points_required: i64,
    /// Picture URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Validated reward fields ready for insert or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDraft {
    /// Display name.
    pub nombre: String,
    /// Description or null.
    pub descripcion: Option<String>,
    /// Cost in points.
    pub puntos_requeridos: i64,
    /// Picture URL or null.
    pub imagen_url: Option<String>,
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

impl RewardInput {
    /// Validates the form.
    pub fn validate(self) -> Result<RewardDraft> {
        let nombre = self.name.trim().to_string();
        if nombre.is_empty() {
            return Err(Error::validation_field("name", "must not be empty"));
        }
        Ok(RewardDraft {
            nombre,
            descripcion: non_blank(self.description),
            puntos_requeridos: self.points_required.max(1),
            imagen_url: non_blank(self.image_url),
        })
    }
}

/// How far a balance is from the next reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardProgress {
    /// Reward being worked towards.
    pub reward: Reward,
    /// Completion percentage, capped at 100.
    pub pct: u32,
    /// Points still missing.
    pub missing: i64,
}

/// Progress towards the next active reward.
///
/// The target is the cheapest active reward costing more than the balance,
/// or the cheapest active reward when the balance already covers them all.
pub fn progress_to_next_reward(balance: i64, rewards: &[Reward]) -> Option<RewardProgress> {
    let active = || rewards.iter().filter(|r| r.activo);
    let target = active()
        .filter(|r| r.puntos_requeridos > balance)
        .min_by_key(|r| r.puntos_requeridos)
        .or_else(|| active().min_by_key(|r| r.puntos_requeridos))?;

    let cost = target.puntos_requeridos.max(1);
    let pct = (balance.max(0) as f64 / cost as f64 * 100.0).min(100.0);
    Some(RewardProgress {
        reward: target.clone(),
        pct: pct.floor() as u32,
        missing: (cost - balance).max(0),
    })
}

// ============================================================================
// Redemptions
// ============================================================================

/// State of a redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedemptionStatus {
    /// Created, points debited, waiting for staff.
    #[serde(rename = "pendiente")]
    Pending,
    /// Handed over to the customer.
    #[serde(rename = "confirmado")]
    Confirmed,
    /// Rolled back, points refunded.
    #[serde(rename = "cancelado")]
    Cancelled,
}

impl RedemptionStatus {
    /// Persisted name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Pending => "pendiente",
            RedemptionStatus::Confirmed => "confirmado",
            RedemptionStatus::Cancelled => "cancelado",
        }
    }
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A points redemption (`canjes_puntos` row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    /// Redemption id.
    pub id: RedemptionId,
    /// Tenant.
    pub restaurante_id: RestaurantId,
    /// Customer who redeemed.
    pub cliente_id: CustomerId,
    /// Reward redeemed.
    pub premio_id: RewardId,
    /// Points debited.
    #[serde(default)]
    pub puntos_usados: i64,
    /// Current state.
    pub estado: RedemptionStatus,
    /// Creation time.
    pub creado_en: DateTime<Utc>,
    /// Confirmation time.
    #[serde(default)]
    pub confirmado_en: Option<DateTime<Utc>>,
}

/// Redemption joined with the data staff need to hand it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionDetail {
    /// The redemption.
    #[serde(flatten)]
    pub redemption: Redemption,
    /// Customer name.
    pub customer_name: Option<String>,
    /// Customer phone.
    pub customer_phone: Option<String>,
    /// Most recent email the customer booked with.
    pub customer_email: Option<String>,
    /// Reward name.
    pub reward_name: Option<String>,
    /// Reward cost.
    pub reward_cost: Option<i64>,
}

/// Redemptions split by state, newest first in each group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionBoard {
    /// Waiting for staff.
    pub pending: Vec<RedemptionDetail>,
    /// Handed over.
    pub confirmed: Vec<RedemptionDetail>,
    /// Rolled back.
    pub cancelled: Vec<RedemptionDetail>,
}

impl RedemptionBoard {
    /// Groups details by state, keeping the input order.
    pub fn from_details(details: impl IntoIterator<Item = RedemptionDetail>) -> Self {
        let mut board = Self::default();
        for detail in details {
            match detail.redemption.estado {
                RedemptionStatus::Pending => board.pending.push(detail),
                RedemptionStatus::Confirmed => board.confirmed.push(detail),
                RedemptionStatus::Cancelled => board.cancelled.push(detail),
            }
        }
        board
    }
}

/// Why a customer-initiated redemption failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedeemFailure {
    /// Balance below the reward cost.
    #[serde(rename = "puntos")]
    InsufficientPoints,
    /// Reward inactive or from another restaurant.
    #[serde(rename = "premio")]
    RewardUnavailable,
    /// Anything else.
    #[serde(rename = "canje")]
    Failed,
}

impl RedeemFailure {
    /// Classifies the message returned by the redeem procedure.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("insuficientes") {
            RedeemFailure::InsufficientPoints
        } else if lower.contains("no disponible") {
            RedeemFailure::RewardUnavailable
        } else {
            RedeemFailure::Failed
        }
    }

    /// Classifies any error raised while redeeming.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Procedure { message, .. } => Self::from_message(message),
            _ => RedeemFailure::Failed,
        }
    }

    /// Short code used by the public page.
    pub fn code(&self) -> &'static str {
        match self {
            RedeemFailure::InsufficientPoints => "puntos",
            RedeemFailure::RewardUnavailable => "premio",
            RedeemFailure::Failed => "canje",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn reward(cost: i64, active: bool) -> Reward {
        Reward {
            id: RewardId::new(),
            restaurante_id: RestaurantId::new(),
            nombre: format!("R{cost}"),
            descripcion: None,
            puntos_requeridos: cost,
            imagen_url: None,
            activo: active,
            creado_en: None,
        }
    }

    #[test]
    fn test_parse_spend() {
        assert_eq!(parse_spend("42,50"), Some(42.5));
        assert_eq!(parse_spend(" 10 "), Some(10.0));
        assert_eq!(parse_spend("0"), Some(0.0));
        assert_eq!(parse_spend(""), None);
        assert_eq!(parse_spend("   "), None);
        assert_eq!(parse_spend("-5"), None);
        assert_eq!(parse_spend("abc"), None);
        assert_eq!(parse_spend("inf"), None);
        assert_eq!(parse_spend("NaN"), None);
    }

    #[test]
    fn test_normalize_points_per_euro() {
        assert_eq!(normalize_points_per_euro(2.5), 2.5);
        assert_eq!(normalize_points_per_euro(0.0), 1.0);
        assert_eq!(normalize_points_per_euro(-1.0), 1.0);
        assert_eq!(normalize_points_per_euro(f64::NAN), 1.0);
    }

    #[test]
    fn test_points_for_spend_floors() {
        let cfg = PointsConfig {
            enabled: true,
            points_per_euro: 1.5,
        };
        assert_eq!(points_for_spend(Some(10.0), &cfg), 15);
        assert_eq!(points_for_spend(Some(10.9), &cfg), 16);
        assert_eq!(points_for_spend(Some(0.5), &cfg), 0);
        assert_eq!(points_for_spend(None, &cfg), 0);
        assert_eq!(points_for_spend(Some(-3.0), &cfg), 0);

        let off = PointsConfig::default();
        assert_eq!(points_for_spend(Some(100.0), &off), 0);
    }

    #[test]
    fn test_reward_input_validation() {
        let draft = RewardInput {
            name: "  Postre  ".into(),
            description: Some("   ".into()),
            points_required: 0,
            image_url: None,
        }
        .validate()
        .unwrap();
        assert_eq!(draft.nombre, "Postre");
        assert_eq!(draft.descripcion, None);
        assert_eq!(draft.puntos_requeridos, 1);

        assert!(RewardInput::default().validate().is_err());
    }

    #[test]
    fn test_progress_targets_next_more_expensive() {
        let rewards = vec![reward(50, true), reward(100, true), reward(200, true)];
        let p = progress_to_next_reward(60, &rewards).unwrap();
        assert_eq!(p.reward.puntos_requeridos, 100);
        assert_eq!(p.pct, 60);
        assert_eq!(p.missing, 40);
    }

    #[test]
    fn test_progress_all_covered_uses_cheapest() {
        let rewards = vec![reward(100, true), reward(50, true)];
        let p = progress_to_next_reward(500, &rewards).unwrap();
        assert_eq!(p.reward.puntos_requeridos, 50);
        assert_eq!(p.pct, 100);
        assert_eq!(p.missing, 0);
    }

    #[test]
    fn test_progress_ignores_inactive_and_empty() {
        assert!(progress_to_next_reward(10, &[]).is_none());
        assert!(progress_to_next_reward(10, &[reward(5, false)]).is_none());
    }

    #[test]
    fn test_redeem_failure_mapping() {
        assert_eq!(
            RedeemFailure::from_message("Puntos insuficientes"),
            RedeemFailure::InsufficientPoints
        );
        assert_eq!(
            RedeemFailure::from_message("Premio NO DISPONIBLE"),
            RedeemFailure::RewardUnavailable
        );
        assert_eq!(RedeemFailure::from_message("boom"), RedeemFailure::Failed);
        assert_eq!(
            RedeemFailure::from_error(&Error::procedure(PROC_REDEEM, "Puntos insuficientes"))
                .code(),
            "puntos"
        );
        assert_eq!(
            RedeemFailure::from_error(&Error::backend("timeout")).code(),
            "canje"
        );
    }

    #[test]
    fn test_redemption_status_serde() {
        assert_eq!(
            serde_json::to_string(&RedemptionStatus::Confirmed).unwrap(),
            "\"confirmado\""
        );
        let s: RedemptionStatus = serde_json::from_str("\"cancelado\"").unwrap();
        assert_eq!(s, RedemptionStatus::Cancelled);
    }

    #[test]
    fn test_board_groups_by_status() {
        let make = |estado| RedemptionDetail {
            redemption: Redemption {
                id: RedemptionId::new(),
                restaurante_id: RestaurantId::new(),
                cliente_id: CustomerId::new(),
                premio_id: RewardId::new(),
                puntos_usados: 10,
                estado,
                creado_en: Utc::now(),
                confirmado_en: None,
            },
            customer_name: None,
            customer_phone: None,
            customer_email: None,
            reward_name: None,
            reward_cost: None,
        };
        let board = RedemptionBoard::from_details(vec![
            make(RedemptionStatus::Pending),
            make(RedemptionStatus::Cancelled),
            make(RedemptionStatus::Pending),
        ]);
        assert_eq!(board.pending.len(), 2);
        assert_eq!(board.confirmed.len(), 0);
        assert_eq!(board.cancelled.len(), 1);
    }
}
