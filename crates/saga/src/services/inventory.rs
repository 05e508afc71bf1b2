//! Inventory step port.

use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ReserveRequest, StockLine};
use inventory::{InventoryService, InventoryStore};
use reqwest::Client;

use super::check_response;
use crate::error::SagaError;

/// Inventory operations the saga needs.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Reserves every line for the order, or nothing.
    async fn reserve(&self, order_id: OrderId, items: &[StockLine]) -> Result<(), SagaError>;

    /// Returns previously reserved lines to stock.
    async fn release(&self, order_id: OrderId, items: &[StockLine]) -> Result<(), SagaError>;
}

#[async_trait]
impl<T: InventoryClient + ?Sized> InventoryClient for Arc<T> {
    async fn reserve(&self, order_id: OrderId, items: &[StockLine]) -> Result<(), SagaError> {
        (**self).reserve(order_id, items).await
    }

    async fn release(&self, order_id: OrderId, items: &[StockLine]) -> Result<(), SagaError> {
        (**self).release(order_id, items).await
    }
}

/// Calls an [`InventoryService`] running in the same process.
#[async_trait]
impl<S: InventoryStore> InventoryClient for InventoryService<S> {
    async fn reserve(&self, _order_id: OrderId, items: &[StockLine]) -> Result<(), SagaError> {
        InventoryService::reserve(self, items).await?;
        Ok(())
    }

    async fn release(&self, _order_id: OrderId, items: &[StockLine]) -> Result<(), SagaError> {
        InventoryService::release(self, items).await?;
        Ok(())
    }
}

/// Calls the inventory service over HTTP.
#[derive(Clone)]
pub struct HttpInventoryClient {
    client: Client,
    base_url: String,
}

impl HttpInventoryClient {
    /// Creates a client for the inventory service at `base_url`
    /// (e.g. `http://localhost:8081`).
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, path: &str, order_id: OrderId, items: &[StockLine]) -> Result<(), SagaError> {
        let request = ReserveRequest {
            order_id,
            products: items.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&request)
            .send()
            .await?;

        check_response("inventory", response).await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn reserve(&self, order_id: OrderId, items: &[StockLine]) -> Result<(), SagaError> {
        self.post("/api/inventory/reserve", order_id, items).await
    }

    async fn release(&self, order_id: OrderId, items: &[StockLine]) -> Result<(), SagaError> {
        self.post("/api/inventory/rollback", order_id, items).await
    }
}
