//! Order service entry point.

use std::error::Error;
use std::sync::Arc;

use api::config::{Config, Service};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{InMemoryOrderStore, OrderService, OrderStore, PostgresOrderStore};
use saga::{HttpInventoryClient, HttpPaymentClient, SagaCoordinator, SagaDispatcher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env(Service::Order)?;
    api::telemetry::init_tracing(&config);
    let metrics_handle = api::telemetry::install_metrics()?;

    match config.database_url.clone() {
        Some(url) => {
            let store = PostgresOrderStore::new(api::server::connect(&url, &config).await?);
            store.run_migrations().await?;
            run(config, store, metrics_handle).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, orders are kept in memory");
            run(config, InMemoryOrderStore::new(), metrics_handle).await
        }
    }
}

async fn run<O>(config: Config, store: O, metrics_handle: PrometheusHandle) -> Result<(), Box<dyn Error>>
where
    O: OrderStore + Clone + 'static,
{
    let http = config.http_client()?;
    let inventory = HttpInventoryClient::new(http.clone(), config.inventory_service_url.as_str());
    let payment = HttpPaymentClient::new(http, config.payment_service_url.as_str());
    tracing::info!(
        inventory = inventory.base_url(),
        payment = payment.base_url(),
        "downstream services"
    );

    let dispatcher = Arc::new(SagaDispatcher::new(SagaCoordinator::new(
        store.clone(),
        inventory,
        payment,
    )));
    let service = Arc::new(OrderService::new(store, dispatcher.clone()));

    api::server::serve(&config, api::order_app(service, metrics_handle)).await?;

    dispatcher.shutdown(config.saga_shutdown_timeout).await;
    Ok(())
}
