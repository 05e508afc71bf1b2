use thiserror::Error;

use crate::model::PaymentStatus;

/// Errors that can occur when recording payments.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The payment request is malformed.
    #[error("Invalid payment request: {0}")]
    Validation(String),

    /// The payment is not in a state that allows the transition.
    #[error("Invalid payment transition from {from} to {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// A stored status string is not a known payment status.
    #[error("Unknown payment status: {0}")]
    UnknownStatus(String),

    /// The store rejected the transaction.
    #[error("Payment store unavailable: {0}")]
    StoreUnavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for payment operations.
pub type Result<T> = std::result::Result<T, PaymentError>;
