//! Customer (CRM) operations.

use super::{BackOffice, Tenant};
use crate::events::ChangeKind;
use gastro_core::customers::{
    CHANNEL_PANEL, Customer, CustomerTier, CustomerTotals, NewCustomer, VisitInput, VisitRecord,
    WalkInInput, local_noon,
};
use gastro_core::loyalty::Redemption;
use gastro_core::reservations::local_day_bounds;
use gastro_core::{CustomerId, Error, Result};
use serde::{Deserialize, Serialize};

/// Customer with its tier, for the list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRow {
    /// Customer row.
    #[serde(flatten)]
    pub customer: Customer,
    /// Tier from the visit count.
    pub tier: CustomerTier,
}

/// The customer list and its totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerList {
    /// Customers, most recent visit first.
    pub customers: Vec<CustomerRow>,
    /// Totals over the whole list.
    pub totals: CustomerTotals,
}

/// Everything shown on a customer's page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetail {
    /// Customer row.
    pub customer: Customer,
    /// Tier from the visit count.
    pub tier: CustomerTier,
    /// Points balance.
    pub points: i64,
    /// History, newest first.
    pub visits: Vec<VisitRecord>,
    /// Redemptions, newest first.
    pub redemptions: Vec<Redemption>,
}

/// Result of registering a walk-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkInOutcome {
    /// Customer the visit was credited to.
    pub customer_id: CustomerId,
    /// Whether the customer was created by this call.
    pub created: bool,
}

impl BackOffice {
    /// All customers with tiers and totals.
    pub async fn list_customers(&self, tenant: &Tenant) -> Result<CustomerList> {
        let customers = self.store.list_customers(tenant.restaurant).await?;
        let totals = CustomerTotals::from_customers(&customers);
        Ok(CustomerList {
            customers: customers
                .into_iter()
                .map(|c| CustomerRow {
                    tier: c.tier(),
                    customer: c,
                })
                .collect(),
            totals,
        })
    }

    /// One customer with balance, history and redemptions.
    pub async fn customer_detail(&self, tenant: &Tenant, id: CustomerId) -> Result<CustomerDetail> {
        let customer = self
            .store
            .get_customer(tenant.restaurant, id)
            .await?
            .ok_or_else(|| Error::not_found("customer", id))?;
        let points = self.store.balance(tenant.restaurant, id).await?;
        let visits = self.store.list_visits(tenant.restaurant, id).await?;
        let redemptions = self
            .store
            .list_redemptions(tenant.restaurant, Some(id))
            .await?;
        Ok(CustomerDetail {
            tier: customer.tier(),
            customer,
            points,
            visits,
            redemptions,
        })
    }

    /// Registers a visit by name without a reservation.
    ///
    /// A customer with the same normalised name gets one more visit;
    /// otherwise the customer is created with its first visit.
    pub async fn register_walk_in(
        &self,
        tenant: &Tenant,
        input: WalkInInput,
    ) -> Result<WalkInOutcome> {
        let walk_in = input.validate()?;
        let at = local_noon(walk_in.date, &self.tz);

        let outcome = match self
            .store
            .find_customer_by_name(tenant.restaurant, &walk_in.normalized)
            .await?
        {
            Some(existing) => {
                self.store
                    .append_visit(&VisitRecord::visit(
                        existing.id,
                        tenant.restaurant,
                        at,
                        walk_in.guests,
                    ))
                    .await?;
                self.store.increment_visit(existing.id).await?;
                WalkInOutcome {
                    customer_id: existing.id,
                    created: false,
                }
            }
            None => {
                let created = self
                    .store
                    .insert_customer(&NewCustomer {
                        restaurante_id: tenant.restaurant,
                        nombre: walk_in.name.clone(),
                        nombre_normalizado: walk_in.normalized.clone(),
                        telefono: None,
                        visitas_totales: 1,
                        ultima_visita: Some(at),
                        canal_contacto: Some(CHANNEL_PANEL.to_string()),
                    })
                    .await?;
                self.store
                    .append_visit(&VisitRecord::visit(
                        created.id,
                        tenant.restaurant,
                        at,
                        walk_in.guests,
                    ))
                    .await?;
                WalkInOutcome {
                    customer_id: created.id,
                    created: true,
                }
            }
        };

        tracing::info!(
            restaurant = %tenant.restaurant,
            customer = %outcome.customer_id,
            created = outcome.created,
            "Walk-in registered"
        );
        self.publish(
            tenant.restaurant,
            ChangeKind::CustomerChanged {
                customer_id: outcome.customer_id,
            },
        );
        Ok(outcome)
    }

    /// Adds a history visit to an existing customer (today when no date).
    pub async fn add_visit(
        &self,
        tenant: &Tenant,
        id: CustomerId,
        input: VisitInput,
    ) -> Result<VisitRecord> {
        let customer = self
            .store
            .get_customer(tenant.restaurant, id)
            .await?
            .ok_or_else(|| Error::not_found("customer", id))?;
        let date = input.date.unwrap_or_else(|| self.today());
        let visit = VisitRecord::visit(
            customer.id,
            tenant.restaurant,
            local_noon(date, &self.tz),
            input.guests,
        );
        self.store.append_visit(&visit).await?;
        self.publish(tenant.restaurant, ChangeKind::CustomerChanged { customer_id: id });
        Ok(visit)
    }

    /// Customers created today.
    pub async fn new_customers_today(&self, tenant: &Tenant) -> Result<usize> {
        let (from, to) = local_day_bounds(self.today(), &self.tz);
        self.store
            .count_customers_created(tenant.restaurant, from, to)
            .await
    }
}
