//! Restaurant settings.

use super::{BackOffice, Tenant};
use crate::events::ChangeKind;
use gastro_core::restaurant::{Restaurant, SettingsInput};
use gastro_core::{Error, Result};

impl BackOffice {
    /// The caller's restaurant row.
    pub async fn get_settings(&self, tenant: &Tenant) -> Result<Restaurant> {
        self.restaurant(tenant).await
    }

    /// Validates and saves the settings form.
    pub async fn update_settings(
        &self,
        tenant: &Tenant,
        input: SettingsInput,
    ) -> Result<Restaurant> {
        let update = input.into_update()?;
        let saved = self
            .store
            .update_settings(tenant.restaurant, &update)
            .await?
            .ok_or_else(|| Error::not_found("restaurant", tenant.restaurant))?;
        tracing::info!(
            restaurant = %tenant.restaurant,
            points = update.points_enabled,
            ratio = update.points_per_euro,
            "Settings saved"
        );
        self.publish(tenant.restaurant, ChangeKind::SettingsChanged);
        Ok(saved)
    }
}
