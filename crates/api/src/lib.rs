//! HTTP surface of the order fulfillment services.
//!
//! Builds the axum routers for the order, inventory and payment services,
//! each with structured logging (tracing), Prometheus metrics and a health
//! check. The binaries in `src/bin` wire them to stores and start them.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use inventory::{InventoryService, InventoryStore};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{OrderService, OrderStore};
use payment::{PaymentLedger, PaymentStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Service;

/// Router for the order service.
pub fn order_app<O: OrderStore + 'static>(
    service: Arc<OrderService<O>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let api = Router::new()
        .route("/api/orders", post(routes::orders::create::<O>))
        .route("/api/orders/{id}", get(routes::orders::get::<O>))
        .with_state(service);

    finish(api, Service::Order, metrics_handle)
}

/// Router for the inventory service.
pub fn inventory_app<S: InventoryStore + 'static>(
    service: Arc<InventoryService<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let api = Router::new()
        .route("/api/inventory/reserve", post(routes::inventory::reserve::<S>))
        .route("/api/inventory/rollback", post(routes::inventory::rollback::<S>))
        .route("/api/inventory/{product_id}", get(routes::inventory::stock::<S>))
        .with_state(service);

    finish(api, Service::Inventory, metrics_handle)
}

/// Router for the payment service.
pub fn payment_app<S: PaymentStore + 'static>(
    ledger: Arc<PaymentLedger<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let api = Router::new()
        .route("/api/payments/process", post(routes::payments::process::<S>))
        .route("/api/payments/rollback", post(routes::payments::rollback::<S>))
        .route("/api/payments/{order_id}", get(routes::payments::for_order::<S>))
        .with_state(ledger);

    finish(api, Service::Payment, metrics_handle)
}

/// Adds the health and metrics endpoints and the shared layers.
fn finish(api: Router, service: Service, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let health_router = Router::new()
        .route("/health", get(routes::health::check))
        .with_state(service.name());

    api.merge(health_router)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
