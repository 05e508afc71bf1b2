use common::OrderId;
use thiserror::Error;

use crate::model::OrderStatus;

/// Errors that can occur when capturing or updating orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order request is malformed.
    #[error("Invalid order: {0}")]
    Validation(String),

    /// No order exists with this id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// The order's current status does not allow the requested transition.
    #[error("Invalid order transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// A stored status string is not a known order status.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),

    /// A stored value does not fit the order model.
    #[error("Corrupt order record: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order operations.
pub type Result<T> = std::result::Result<T, OrderError>;
