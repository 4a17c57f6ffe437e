//! Reward catalogue and redemption handling for staff.

use super::{BackOffice, Tenant};
use crate::events::ChangeKind;
use gastro_core::loyalty::{RedemptionBoard, RedemptionDetail, Reward, RewardInput};
use gastro_core::{Error, RedemptionId, Result, RewardId};
use std::collections::{HashMap, HashSet};

impl BackOffice {
    // ------------------------------------------------------------------------
    // Catalogue
    // ------------------------------------------------------------------------

    /// Whole catalogue, cheapest first.
    pub async fn list_rewards(&self, tenant: &Tenant) -> Result<Vec<Reward>> {
        self.store.list_rewards(tenant.restaurant, false).await
    }

    /// Adds an active reward.
    pub async fn create_reward(&self, tenant: &Tenant, input: RewardInput) -> Result<Reward> {
        let draft = input.validate()?;
        let reward = self.store.insert_reward(tenant.restaurant, &draft).await?;
        tracing::info!(restaurant = %tenant.restaurant, reward = %reward.id, "Reward created");
        self.publish(tenant.restaurant, ChangeKind::RewardsChanged);
        Ok(reward)
    }

    /// Rewrites a reward.
    pub async fn update_reward(
        &self,
        tenant: &Tenant,
        id: RewardId,
        input: RewardInput,
    ) -> Result<Reward> {
        let draft = input.validate()?;
        let reward = self
            .store
            .update_reward(tenant.restaurant, id, &draft)
            .await?
            .ok_or_else(|| Error::not_found("reward", id))?;
        self.publish(tenant.restaurant, ChangeKind::RewardsChanged);
        Ok(reward)
    }

    /// Switches a reward on or off.
    pub async fn set_reward_active(
        &self,
        tenant: &Tenant,
        id: RewardId,
        active: bool,
    ) -> Result<Reward> {
        let reward = self
            .store
            .set_reward_active(tenant.restaurant, id, active)
            .await?
            .ok_or_else(|| Error::not_found("reward", id))?;
        self.publish(tenant.restaurant, ChangeKind::RewardsChanged);
        Ok(reward)
    }

    /// Removes a reward.
    pub async fn delete_reward(&self, tenant: &Tenant, id: RewardId) -> Result<()> {
        if !self.store.delete_reward(tenant.restaurant, id).await? {
            return Err(Error::not_found("reward", id));
        }
        tracing::info!(restaurant = %tenant.restaurant, reward = %id, "Reward deleted");
        self.publish(tenant.restaurant, ChangeKind::RewardsChanged);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Redemptions
    // ------------------------------------------------------------------------

    /// Redemptions grouped by state, with customer and reward details.
    pub async fn redemption_board(&self, tenant: &Tenant) -> Result<RedemptionBoard> {
        let rid = tenant.restaurant;
        let redemptions = self.store.list_redemptions(rid, None).await?;

        let customer_ids: Vec<_> = redemptions
            .iter()
            .map(|r| r.cliente_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let reward_ids: Vec<_> = redemptions
            .iter()
            .map(|r| r.premio_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let customers: HashMap<_, _> = self
            .store
            .customers_by_ids(rid, &customer_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let rewards: HashMap<_, _> = self
            .store
            .rewards_by_ids(rid, &reward_ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        let emails = self.store.latest_emails(rid, &customer_ids).await?;

        Ok(RedemptionBoard::from_details(redemptions.into_iter().map(
            |redemption| {
                let customer = customers.get(&redemption.cliente_id);
                let reward = rewards.get(&redemption.premio_id);
                RedemptionDetail {
                    customer_name: customer.and_then(|c| c.nombre.clone()),
                    customer_phone: customer.and_then(|c| c.telefono.clone()),
                    customer_email: emails.get(&redemption.cliente_id).cloned(),
                    reward_name: reward.map(|r| r.nombre.clone()),
                    reward_cost: reward.map(|r| r.puntos_requeridos),
                    redemption,
                }
            },
        )))
    }

    /// Marks a pending redemption as handed over.
    pub async fn confirm_redemption(&self, tenant: &Tenant, id: RedemptionId) -> Result<()> {
        self.store.confirm_redemption(tenant.restaurant, id).await?;
        tracing::info!(restaurant = %tenant.restaurant, redemption = %id, "Redemption confirmed");
        self.publish(
            tenant.restaurant,
            ChangeKind::RedemptionChanged {
                redemption_id: Some(id),
            },
        );
        Ok(())
    }

    /// Cancels a pending redemption; the store refunds the points.
    pub async fn cancel_redemption(&self, tenant: &Tenant, id: RedemptionId) -> Result<()> {
        self.store.cancel_redemption(tenant.restaurant, id).await?;
        tracing::info!(restaurant = %tenant.restaurant, redemption = %id, "Redemption cancelled");
        self.publish(
            tenant.restaurant,
            ChangeKind::RedemptionChanged {
                redemption_id: Some(id),
            },
        );
        Ok(())
    }
}
