//! Subcommand implementations.

pub mod report;
pub mod serve;

use std::sync::Arc;

use crate::config::GastroConfig;
use crate::demo::seed_demo;
use crate::error::{Error, Result};
use gastro_core::{RestaurantId, UserId};
use gastro_service::{BackOffice, Tenant, create_notifier};
use gastro_store::{BackendKind, MemoryStore, Store, create_store};

/// A back-office wired from the configuration.
pub struct Runtime {
    /// Operations.
    pub office: Arc<BackOffice>,
    /// Demo tenant, seeded when running in memory.
    pub demo: Option<Tenant>,
}

impl Runtime {
    /// Opens the configured backend and webhooks.
    pub async fn open(config: &GastroConfig) -> Result<Self> {
        let notifier = create_notifier(&config.webhooks)?;
        match config.backend.kind {
            BackendKind::Memory => {
                let memory = Arc::new(MemoryStore::new());
                let store: Arc<dyn Store> = memory.clone();
                let office = BackOffice::new(store, &config.occupancy)?.with_notifier(notifier);
                let demo = seed_demo(&memory, &office).await?;
                Ok(Self {
                    office: Arc::new(office),
                    demo: Some(demo),
                })
            }
            BackendKind::Hosted => {
                let store = create_store(&config.backend)?;
                let office = BackOffice::new(store, &config.occupancy)?.with_notifier(notifier);
                Ok(Self {
                    office: Arc::new(office),
                    demo: None,
                })
            }
        }
    }

    /// Tenant for a report: the given restaurant, else the demo one.
    ///
    /// Reports run with operator rights, so no membership is checked.
    pub fn report_tenant(&self, restaurant: Option<RestaurantId>) -> Result<Tenant> {
        match (restaurant, self.demo) {
            (Some(restaurant), demo) => Ok(Tenant {
                user: demo.map_or_else(UserId::new, |d| d.user),
                restaurant,
            }),
            (None, Some(demo)) => Ok(demo),
            (None, None) => Err(Error::config(
                "--restaurant is required with the hosted backend",
            )),
        }
    }
}
