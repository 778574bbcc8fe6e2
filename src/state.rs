use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::contact::notifier::{ContactNotifier, DisabledNotifier, EmailNotifier};
use crate::db::{PgStore, Store};
use crate::packages::Catalog;
use crate::purchases::provider::{PaymentProvider, StripeClient};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub catalog: Arc<Catalog>,
    pub payments: Arc<dyn PaymentProvider>,
    pub notifier: Arc<dyn ContactNotifier>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = PgStore::connect(&config.database_url).await?;
        if let Err(e) = store.migrate().await {
            warn!(error = %e, "migrations failed; continuing");
        }

        let catalog = match &config.coin_packages_path {
            Some(path) => {
                let catalog = Catalog::from_json_file(path)
                    .with_context(|| format!("load coin packages from {path}"))?;
                info!(path = %path, packages = catalog.packages().len(), "coin catalog loaded");
                catalog
            }
            None => Catalog::default(),
        };

        let payments = Arc::new(StripeClient::new(&config.stripe)) as Arc<dyn PaymentProvider>;
        let notifier = match EmailNotifier::from_config(&config.email) {
            Some(n) => Arc::new(n) as Arc<dyn ContactNotifier>,
            None => Arc::new(DisabledNotifier) as Arc<dyn ContactNotifier>,
        };

        Ok(Self::from_parts(Arc::new(store), config, Arc::new(catalog), payments, notifier))
    }

    pub fn from_parts(
        store: Arc<dyn Store>,
        config: Arc<AppConfig>,
        catalog: Arc<Catalog>,
        payments: Arc<dyn PaymentProvider>,
        notifier: Arc<dyn ContactNotifier>,
    ) -> Self {
        Self {
            store,
            config,
            catalog,
            payments,
            notifier,
        }
    }
}
