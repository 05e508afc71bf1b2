//! Payment service entry point.

use std::error::Error;
use std::sync::Arc;

use api::config::{Config, Service};
use metrics_exporter_prometheus::PrometheusHandle;
use payment::{InMemoryPaymentStore, PaymentLedger, PaymentStore, PostgresPaymentStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env(Service::Payment)?;
    api::telemetry::init_tracing(&config);
    let metrics_handle = api::telemetry::install_metrics()?;

    match config.database_url.clone() {
        Some(url) => {
            let store = PostgresPaymentStore::new(api::server::connect(&url, &config).await?);
            store.run_migrations().await?;
            run(config, store, metrics_handle).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, payments are kept in memory");
            run(config, InMemoryPaymentStore::new(), metrics_handle).await
        }
    }
}

async fn run<S>(config: Config, store: S, metrics_handle: PrometheusHandle) -> Result<(), Box<dyn Error>>
where
    S: PaymentStore + 'static,
{
    let ledger = Arc::new(PaymentLedger::new(store));
    api::server::serve(&config, api::payment_app(ledger, metrics_handle)).await?;
    Ok(())
}
