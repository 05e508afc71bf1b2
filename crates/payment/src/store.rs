use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId};

use crate::Result;
use crate::model::{Payment, PaymentStatus};

/// Storage for payment records.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Transaction type handed out by [`PaymentStore::begin`].
    type Transaction: PaymentTransaction;

    /// Starts a new transaction.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Returns every payment for an order, most recent first.
    async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>>;

    /// Marks every payment of an order `failed`.
    ///
    /// Returns the number of payments that changed; payments already failed
    /// are left alone.
    async fn fail_order_payments(&self, order_id: OrderId) -> Result<u64>;
}

/// A unit of work over payment records.
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait PaymentTransaction: Send {
    /// Inserts a new payment record.
    async fn insert(&mut self, payment: &Payment) -> Result<()>;

    /// Updates the status of a payment inserted earlier.
    async fn update_status(
        &mut self,
        payment_id: PaymentId,
        status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Commits all writes.
    async fn commit(self) -> Result<()>;
}
