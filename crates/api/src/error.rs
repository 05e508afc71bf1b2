//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::ErrorResponse;
use inventory::InventoryError;
use orders::OrderError;
use payment::PaymentError;

/// API-level error type that maps to HTTP responses.
///
/// Every error is rendered as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Inventory service error.
    Inventory(InventoryError),
    /// Payment ledger error.
    Payment(PaymentError),
    /// Order capture error.
    Order(OrderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Inventory(err) => (inventory_status(&err), err.to_string()),
            ApiError::Payment(err) => (payment_status(&err), err.to_string()),
            ApiError::Order(err) => (order_status(&err), err.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

fn inventory_status(err: &InventoryError) -> StatusCode {
    match err {
        InventoryError::Validation(_) | InventoryError::InsufficientInventory { .. } => {
            StatusCode::BAD_REQUEST
        }
        InventoryError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::Database(_) | InventoryError::Migration(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn payment_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::Validation(_) => StatusCode::BAD_REQUEST,
        PaymentError::InvalidTransition { .. } => StatusCode::CONFLICT,
        PaymentError::UnknownStatus(_)
        | PaymentError::StoreUnavailable(_)
        | PaymentError::Database(_)
        | PaymentError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn order_status(err: &OrderError) -> StatusCode {
    match err {
        OrderError::Validation(_) => StatusCode::BAD_REQUEST,
        OrderError::NotFound(_) => StatusCode::NOT_FOUND,
        OrderError::InvalidTransition { .. } => StatusCode::CONFLICT,
        OrderError::UnknownStatus(_)
        | OrderError::Corrupt(_)
        | OrderError::Database(_)
        | OrderError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::Inventory(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Parses a UUID path segment, rejecting malformed ids with 400.
pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            inventory_status(&InventoryError::InsufficientInventory {
                product_id: ProductId::new("p1"),
                requested: 10,
                available: 5,
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            inventory_status(&InventoryError::ProductNotFound(ProductId::new("p9"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            order_status(&OrderError::InvalidTransition {
                from: orders::OrderStatus::Completed,
                to: orders::OrderStatus::Failed,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            payment_status(&PaymentError::StoreUnavailable("down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_uuid_is_bad_request() {
        assert!(matches!(
            parse_uuid("not-a-uuid", "order id"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
