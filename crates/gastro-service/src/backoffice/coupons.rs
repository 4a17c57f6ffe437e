//! Automatic promotions managed by staff.

use super::{BackOffice, Tenant};
use crate::events::ChangeKind;
use gastro_core::promotions::{Coupon, CouponInput};
use gastro_core::{CouponId, Error, Result};

impl BackOffice {
    /// All coupons, newest first.
    pub async fn list_coupons(&self, tenant: &Tenant) -> Result<Vec<Coupon>> {
        self.store.list_coupons(tenant.restaurant, false).await
    }

    /// Adds a coupon.
    pub async fn create_coupon(&self, tenant: &Tenant, input: CouponInput) -> Result<Coupon> {
        let draft = input.validate()?;
        let coupon = self.store.insert_coupon(tenant.restaurant, &draft).await?;
        tracing::info!(restaurant = %tenant.restaurant, coupon = %coupon.id, "Coupon created");
        self.publish(
            tenant.restaurant,
            ChangeKind::CouponsChanged {
                coupon_id: coupon.id,
            },
        );
        Ok(coupon)
    }

    /// Rewrites a coupon.
    pub async fn update_coupon(
        &self,
        tenant: &Tenant,
        id: CouponId,
        input: CouponInput,
    ) -> Result<Coupon> {
        let draft = input.validate()?;
        let coupon = self
            .store
            .update_coupon(tenant.restaurant, id, &draft)
            .await?
            .ok_or_else(|| Error::not_found("coupon", id))?;
        self.publish(tenant.restaurant, ChangeKind::CouponsChanged { coupon_id: id });
        Ok(coupon)
    }

    /// Switches a coupon on or off.
    pub async fn set_coupon_active(
        &self,
        tenant: &Tenant,
        id: CouponId,
        active: bool,
    ) -> Result<Coupon> {
        let coupon = self
            .store
            .set_coupon_active(tenant.restaurant, id, active)
            .await?
            .ok_or_else(|| Error::not_found("coupon", id))?;
        self.publish(tenant.restaurant, ChangeKind::CouponsChanged { coupon_id: id });
        Ok(coupon)
    }

    /// Removes a coupon.
    pub async fn delete_coupon(&self, tenant: &Tenant, id: CouponId) -> Result<()> {
        if !self.store.delete_coupon(tenant.restaurant, id).await? {
            return Err(Error::not_found("coupon", id));
        }
        tracing::info!(restaurant = %tenant.restaurant, coupon = %id, "Coupon deleted");
        self.publish(tenant.restaurant, ChangeKind::CouponsChanged { coupon_id: id });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::super::testing::Harness;
    use super::*;
    use gastro_core::promotions::CouponConditions;

    pub(crate) fn birthday() -> CouponInput {
        CouponInput {
            name: "Cumpleaños".into(),
            benefit: "Postre gratis".into(),
            conditions: CouponConditions::Birthday {
                validez_dias: 0,
                dias_antes: 3,
            },
            active: true,
        }
    }

    pub(crate) fn off_peak(days: Vec<u8>) -> CouponInput {
        CouponInput {
            name: "Horas valle".into(),
            benefit: "10% dto.".into(),
            conditions: CouponConditions::OffPeak {
                dias_semana: days,
                hora_inicio: "16:00".into(),
                hora_fin: "19:00".into(),
                cada_x_visitas: 1,
            },
            active: true,
        }
    }

    #[tokio::test]
    async fn test_create_clamps_validity() {
        let h = Harness::new().await;
        let coupon = h.office.create_coupon(&h.tenant, birthday()).await.unwrap();
        assert_eq!(
            coupon.condiciones,
            Some(CouponConditions::Birthday {
                validez_dias: 1,
                dias_antes: 3,
            })
        );
        assert_eq!(h.office.list_coupons(&h.tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_off_peak_requires_days() {
        let h = Harness::new().await;
        let err = h
            .office
            .create_coupon(&h.tenant, off_peak(vec![]))
            .await
            .unwrap_err();
        let Error::Validation { field, .. } = err else {
            unreachable!("expected validation error");
        };
        assert_eq!(field.as_deref(), Some("days"));
    }

    #[tokio::test]
    async fn test_update_toggle_delete() {
        let h = Harness::new().await;
        let coupon = h
            .office
            .create_coupon(&h.tenant, off_peak(vec![0, 1]))
            .await
            .unwrap();
        let mut input = off_peak(vec![4, 4, 9]);
        input.benefit = "Café gratis".into();
        let updated = h
            .office
            .update_coupon(&h.tenant, coupon.id, input)
            .await
            .unwrap();
        assert_eq!(updated.beneficio, "Café gratis");
        let Some(CouponConditions::OffPeak { dias_semana, .. }) = updated.condiciones else {
            unreachable!("expected off-peak conditions");
        };
        assert_eq!(dias_semana, vec![4]);

        let off = h
            .office
            .set_coupon_active(&h.tenant, coupon.id, false)
            .await
            .unwrap();
        assert!(!off.activo);

        h.office.delete_coupon(&h.tenant, coupon.id).await.unwrap();
        assert!(matches!(
            h.office.set_coupon_active(&h.tenant, coupon.id, true).await,
            Err(Error::NotFound { .. })
        ));
    }
}
