//! Inventory service entry point.

use std::error::Error;
use std::sync::Arc;

use api::config::{Config, Service};
use inventory::{InMemoryInventoryStore, InventoryService, InventoryStore, PostgresInventoryStore};
use metrics_exporter_prometheus::PrometheusHandle;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env(Service::Inventory)?;
    api::telemetry::init_tracing(&config);
    let metrics_handle = api::telemetry::install_metrics()?;

    match config.database_url.clone() {
        Some(url) => {
            let store = PostgresInventoryStore::new(api::server::connect(&url, &config).await?);
            store.run_migrations().await?;
            run(config, store, metrics_handle).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, inventory is kept in memory");
            run(config, InMemoryInventoryStore::new(), metrics_handle).await
        }
    }
}

async fn run<S>(config: Config, store: S, metrics_handle: PrometheusHandle) -> Result<(), Box<dyn Error>>
where
    S: InventoryStore + 'static,
{
    let service = Arc::new(InventoryService::new(store));

    for (product_id, quantity) in &config.inventory_seed {
        service.stock(product_id, *quantity).await?;
        tracing::info!(%product_id, quantity, "seeded stock");
    }

    api::server::serve(&config, api::inventory_app(service, metrics_handle)).await?;
    Ok(())
}
