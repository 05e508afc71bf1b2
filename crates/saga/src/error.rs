//! Saga error types.

use inventory::InventoryError;
use orders::OrderError;
use payment::PaymentError;
use thiserror::Error;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The inventory service rejected or failed a call made in-process.
    #[error("Inventory service error: {0}")]
    Inventory(#[from] InventoryError),

    /// The payment service rejected or failed a call made in-process.
    #[error("Payment service error: {0}")]
    Payment(#[from] PaymentError),

    /// The order store failed while reading or writing the order.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// A remote service answered with a non-success status.
    #[error("{service} service responded {status}: {message}")]
    Downstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// A remote service could not be reached.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The dispatcher no longer accepts sagas.
    #[error("Saga dispatcher is shutting down")]
    ShuttingDown,

    /// The saga task was cancelled before it finished.
    #[error("Saga was cancelled")]
    Cancelled,
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
