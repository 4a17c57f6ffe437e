//! The customer-facing rewards page, reached by public token.
//!
//! These calls are not tenant-scoped by a session: the token identifies the
//! customer and through it the restaurant.

use super::BackOffice;
use crate::events::ChangeKind;
use gastro_core::customers::Customer;
use gastro_core::loyalty::{
    RedeemFailure, Redemption, Reward, RewardProgress, progress_to_next_reward,
};
use gastro_core::promotions::{Coupon, Eligibility};
use gastro_core::restaurant::{Branding, Restaurant};
use gastro_core::{Error, Result, RewardId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A redemption as the customer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicRedemption {
    /// The redemption.
    #[serde(flatten)]
    pub redemption: Redemption,
    /// Name of the reward, when it still exists.
    pub reward_name: Option<String>,
}

/// An active coupon with its eligibility for this customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// The coupon.
    pub coupon: Coupon,
    /// Whether and why it can be used now.
    pub eligibility: Eligibility,
}

/// Everything on the rewards page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicPage {
    /// Customer display name.
    pub customer_name: Option<String>,
    /// Restaurant branding.
    pub branding: Branding,
    /// Points balance.
    pub points: i64,
    /// Active rewards, cheapest first.
    pub rewards: Vec<Reward>,
    /// The customer's redemptions, newest first.
    pub redemptions: Vec<PublicRedemption>,
    /// Birthday and off-peak offers.
    pub promotions: Vec<Promotion>,
    /// Progress to the next reward, when any reward is active.
    pub progress: Option<RewardProgress>,
}

/// Result of a redemption requested from the rewards page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemOutcome {
    /// Whether the points were debited.
    pub ok: bool,
    /// Failure code when not.
    pub error: Option<RedeemFailure>,
}

impl RedeemOutcome {
    fn success() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn failure(reason: RedeemFailure) -> Self {
        Self {
            ok: false,
            error: Some(reason),
        }
    }
}

impl BackOffice {
    async fn customer_by_token(&self, token: &str) -> Result<Customer> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::not_found("customer", "<empty token>"));
        }
        self.store
            .find_customer_by_token(token)
            .await?
            .ok_or_else(|| Error::not_found("customer", token))
    }

    /// Builds the rewards page of the customer owning `token`.
    pub async fn public_page(&self, token: &str) -> Result<PublicPage> {
        let customer = self.customer_by_token(token).await?;
        let rid = customer.restaurante_id;

        let branding = self
            .store
            .get_restaurant(rid)
            .await?
            .unwrap_or_else(|| Restaurant {
                name: None,
                ..Restaurant::new(rid, "")
            })
            .branding();
        let points = self.store.balance(rid, customer.id).await?;
        let rewards = self.store.list_rewards(rid, true).await?;

        let redeemed = self.store.list_redemptions(rid, Some(customer.id)).await?;
        let reward_ids: Vec<RewardId> = redeemed.iter().map(|r| r.premio_id).collect();
        let names: HashMap<RewardId, String> = self
            .store
            .rewards_by_ids(rid, &reward_ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r.nombre))
            .collect();
        let redemptions = redeemed
            .into_iter()
            .map(|redemption| PublicRedemption {
                reward_name: names.get(&redemption.premio_id).cloned(),
                redemption,
            })
            .collect();

        let now = self.local_now();
        let promotions = self
            .store
            .list_coupons(rid, true)
            .await?
            .into_iter()
            .filter_map(|coupon| {
                coupon
                    .eligibility(customer.fecha_nacimiento, now)
                    .map(|eligibility| Promotion {
                        coupon,
                        eligibility,
                    })
            })
            .collect();

        Ok(PublicPage {
            customer_name: customer.nombre,
            branding,
            points,
            progress: progress_to_next_reward(points, &rewards),
            rewards,
            redemptions,
            promotions,
        })
    }

    /// Redeems a reward for the customer owning `token`.
    ///
    /// Failures of the redeem procedure come back as an outcome with a code;
    /// an unknown token is an error.
    pub async fn public_redeem(&self, token: &str, reward: RewardId) -> Result<RedeemOutcome> {
        let customer = self.customer_by_token(token).await?;
        let rid = customer.restaurante_id;

        match self.store.redeem(rid, customer.id, reward).await {
            Ok(()) => {
                tracing::info!(
                    restaurant = %rid,
                    customer = %customer.id,
                    %reward,
                    "Reward redeemed"
                );
                self.publish(rid, ChangeKind::RedemptionChanged { redemption_id: None });
                Ok(RedeemOutcome::success())
            }
            Err(e) => {
                let reason = RedeemFailure::from_error(&e);
                tracing::warn!(
                    restaurant = %rid,
                    customer = %customer.id,
                    %reward,
                    code = reason.code(),
                    error = %e,
                    "Redemption refused"
                );
                Ok(RedeemOutcome::failure(reason))
            }
        }
    }
}
