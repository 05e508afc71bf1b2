//! Payment ledger for the order fulfillment saga.
//!
//! Processing has no external gateway: a payment is recorded as
//! `processing` and finalised as `completed` in the same store transaction.
//! Compensation marks an order's payments `failed`.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use error::{PaymentError, Result};
pub use ledger::PaymentLedger;
pub use memory::InMemoryPaymentStore;
pub use model::{Payment, PaymentStatus};
pub use postgres::PostgresPaymentStore;
pub use store::{PaymentStore, PaymentTransaction};
