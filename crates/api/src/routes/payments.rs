//! Payment ledger endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use common::{MessageResponse, OrderId, PaymentRequest, PaymentRollbackRequest};
use payment::{Payment, PaymentLedger, PaymentStore};

use crate::error::{ApiError, parse_uuid};

/// POST /api/payments/process: record and complete a payment.
#[tracing::instrument(skip(ledger, payload))]
pub async fn process<S: PaymentStore + 'static>(
    State(ledger): State<Arc<PaymentLedger<S>>>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<Payment>, ApiError> {
    let Json(request) = payload?;
    let payment = ledger
        .process(request.order_id, request.amount, &request.user_id)
        .await?;
    Ok(Json(payment))
}

/// POST /api/payments/rollback: mark every payment of an order failed.
#[tracing::instrument(skip(ledger, payload))]
pub async fn rollback<S: PaymentStore + 'static>(
    State(ledger): State<Arc<PaymentLedger<S>>>,
    payload: Result<Json<PaymentRollbackRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    ledger.compensate(request.order_id).await?;
    Ok(Json(MessageResponse::new("Payment rolled back successfully")))
}

/// GET /api/payments/{orderId}: payments recorded for an order, newest first.
#[tracing::instrument(skip(ledger))]
pub async fn for_order<S: PaymentStore + 'static>(
    State(ledger): State<Arc<PaymentLedger<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&order_id, "order id")?);
    let payments = ledger.payments_for_order(order_id).await?;
    Ok(Json(payments))
}
