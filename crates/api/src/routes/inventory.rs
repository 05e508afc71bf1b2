//! Inventory reservation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::{MessageResponse, ProductId, ReserveRequest};
use inventory::{InventoryService, InventoryStore};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// POST /api/inventory/reserve: reserve every listed product, or none.
#[tracing::instrument(skip(service, payload))]
pub async fn reserve<S: InventoryStore + 'static>(
    State(service): State<Arc<InventoryService<S>>>,
    payload: Result<Json<ReserveRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::debug!(order_id = %request.order_id, "reserve requested");
    service.reserve(&request.products).await?;
    Ok(Json(MessageResponse::new("Inventory reserved successfully")))
}

/// POST /api/inventory/rollback: return the listed quantities to stock.
#[tracing::instrument(skip(service, payload))]
pub async fn rollback<S: InventoryStore + 'static>(
    State(service): State<Arc<InventoryService<S>>>,
    payload: Result<Json<ReserveRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::debug!(order_id = %request.order_id, "rollback requested");
    service.release(&request.products).await?;
    Ok(Json(MessageResponse::new("Inventory rolled back successfully")))
}

/// GET /api/inventory/{productId}: current stock of a product.
#[tracing::instrument(skip(service))]
pub async fn stock<S: InventoryStore + 'static>(
    State(service): State<Arc<InventoryService<S>>>,
    Path(product_id): Path<String>,
) -> Result<Json<StockResponse>, ApiError> {
    let product_id = ProductId::new(product_id);
    let quantity = service.quantity(&product_id).await?;
    Ok(Json(StockResponse {
        product_id,
        quantity,
    }))
}
