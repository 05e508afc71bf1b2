//! Order record and its state machine.

use chrono::{DateTime, Utc};
use common::{LineItem, Money, OrderId, StockLine};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// The state of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Completed
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order captured, fulfillment in progress.
    #[default]
    Pending,

    /// Inventory reserved and payment taken (terminal state).
    Completed,

    /// A fulfillment step failed (terminal state).
    Failed,
}

impl OrderStatus {
    /// Returns true if an order in this state may move to `to`.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Pending, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Failed)
        )
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Failed)
    }

    /// Returns the status name as stored and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Body of a create-order request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub amount: Money,
    pub line_items: Vec<LineItem>,
}

impl CreateOrderRequest {
    pub fn new(user_id: impl Into<String>, amount: Money, line_items: Vec<LineItem>) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
            line_items,
        }
    }

    /// Checks the request before anything is persisted.
    ///
    /// `amount` is taken as stated; it is not compared with the line totals.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.user_id.trim().is_empty() {
            return Err(OrderError::Validation(
                "userId must not be empty".to_string(),
            ));
        }
        if self.amount.is_negative() {
            return Err(OrderError::Validation(
                "amount must not be negative".to_string(),
            ));
        }
        if self.line_items.is_empty() {
            return Err(OrderError::Validation(
                "at least one line item is required".to_string(),
            ));
        }
        for item in &self.line_items {
            if item.product_id.is_blank() {
                return Err(OrderError::Validation(
                    "productId must not be empty".to_string(),
                ));
            }
            if item.quantity == 0 {
                return Err(OrderError::Validation(format!(
                    "quantity for product {} must be positive",
                    item.product_id
                )));
            }
            if item.price.is_negative() {
                return Err(OrderError::Validation(format!(
                    "price for product {} must not be negative",
                    item.product_id
                )));
            }
        }
        Ok(())
    }
}

/// A purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    pub amount: Money,
    pub status: OrderStatus,
    pub line_items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new `pending` order with a fresh id.
    pub fn new(user_id: impl Into<String>, amount: Money, line_items: Vec<LineItem>) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id: user_id.into(),
            amount,
            status: OrderStatus::Pending,
            line_items,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the product quantities to reserve for this order.
    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.line_items.iter().map(LineItem::stock_line).collect()
    }

    /// Moves the order to `to`, if the state machine allows it.
    pub fn transition(&mut self, to: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl From<CreateOrderRequest> for Order {
    fn from(request: CreateOrderRequest) -> Self {
        Order::new(request.user_id, request.amount, request.line_items)
    }
}
