//! JSON bodies exchanged between the services.

use serde::{Deserialize, Serialize};

use crate::{Money, OrderId, StockLine};

/// Body of `POST /api/inventory/reserve` and `POST /api/inventory/rollback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    pub order_id: OrderId,
    pub products: Vec<StockLine>,
}

/// Body of `POST /api/payments/process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub user_id: String,
}

/// Body of `POST /api/payments/rollback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRollbackRequest {
    pub order_id: OrderId,
}

/// Acknowledgement body for operations with no resource to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error body returned by every service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_request_wire_shape() {
        let order_id = OrderId::new();
        let request = ReserveRequest {
            order_id,
            products: vec![StockLine::new("p1", 2)],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "orderId": order_id.to_string(),
                "products": [{ "productId": "p1", "quantity": 2 }]
            })
        );
    }

    #[test]
    fn payment_request_reads_decimal_amount() {
        let order_id = OrderId::new();
        let json = format!(r#"{{"orderId":"{order_id}","amount":50.0,"userId":"u1"}}"#);
        let request: PaymentRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request.amount, Money::from_cents(5000));
        assert_eq!(request.user_id, "u1");
    }
}
