//! Order capture endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use orders::{CreateOrderRequest, Order, OrderService, OrderStore};

use crate::error::{ApiError, parse_uuid};

/// POST /api/orders: capture an order and start its saga.
///
/// Responds as soon as the order is stored; the body always shows `pending`.
#[tracing::instrument(skip(service, payload))]
pub async fn create<O: OrderStore + 'static>(
    State(service): State<Arc<OrderService<O>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(request) = payload?;
    let order = service.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders/{id}: load an order with its current status.
#[tracing::instrument(skip(service))]
pub async fn get<O: OrderStore + 'static>(
    State(service): State<Arc<OrderService<O>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&id, "order id")?);
    let order = service.get_order(order_id).await?;
    Ok(Json(order))
}
