use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId};
use tokio::sync::RwLock;

use crate::error::{PaymentError, Result};
use crate::model::{Payment, PaymentStatus};
use crate::store::{PaymentStore, PaymentTransaction};

/// In-memory payment store for tests and database-less runs.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<Vec<Payment>>>,
    fail_on_commit: Arc<AtomicBool>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent commit fail, simulating an aborted transaction.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of payments stored.
    pub async fn payment_count(&self) -> usize {
        self.payments.read().await.len()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    type Transaction = InMemoryPaymentTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        Ok(InMemoryPaymentTransaction {
            store: self.clone(),
            writes: Vec::new(),
        })
    }

    async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .payments
            .read()
            .await
            .iter()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    async fn fail_order_payments(&self, order_id: OrderId) -> Result<u64> {
        let mut payments = self.payments.write().await;
        let mut changed = 0;
        for payment in payments
            .iter_mut()
            .filter(|p| p.order_id == order_id && p.status.can_fail())
        {
            payment.fail()?;
            changed += 1;
        }
        Ok(changed)
    }
}

enum PendingWrite {
    Insert(Payment),
    Status(PaymentId, PaymentStatus, DateTime<Utc>),
}

/// Transaction over an [`InMemoryPaymentStore`]; writes are buffered until commit.
pub struct InMemoryPaymentTransaction {
    store: InMemoryPaymentStore,
    writes: Vec<PendingWrite>,
}

#[async_trait]
impl PaymentTransaction for InMemoryPaymentTransaction {
    async fn insert(&mut self, payment: &Payment) -> Result<()> {
        self.writes.push(PendingWrite::Insert(payment.clone()));
        Ok(())
    }

    async fn update_status(
        &mut self,
        payment_id: PaymentId,
        status: PaymentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        self.writes
            .push(PendingWrite::Status(payment_id, status, updated_at));
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        if self.store.fail_on_commit.load(Ordering::SeqCst) {
            return Err(PaymentError::StoreUnavailable(
                "transaction aborted".to_string(),
            ));
        }

        let mut payments = self.store.payments.write().await;
        for write in self.writes {
            match write {
                PendingWrite::Insert(payment) => payments.push(payment),
                PendingWrite::Status(id, status, updated_at) => {
                    if let Some(payment) = payments.iter_mut().find(|p| p.id == id) {
                        payment.status = status;
                        payment.updated_at = updated_at;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    #[tokio::test]
    async fn test_commit_applies_buffered_writes() {
        let store = InMemoryPaymentStore::new();
        let payment = Payment::new(OrderId::new(), Money::from_cents(100), "u1");

        let mut tx = store.begin().await.unwrap();
        tx.insert(&payment).await.unwrap();
        tx.update_status(payment.id, PaymentStatus::Completed, Utc::now())
            .await
            .unwrap();
        assert_eq!(store.payment_count().await, 0);
        tx.commit().await.unwrap();

        let stored = store.payments_for_order(payment.order_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_commit_writes_nothing() {
        let store = InMemoryPaymentStore::new();
        store.set_fail_on_commit(true);
        let payment = Payment::new(OrderId::new(), Money::from_cents(100), "u1");

        let mut tx = store.begin().await.unwrap();
        tx.insert(&payment).await.unwrap();
        assert!(matches!(
            tx.commit().await,
            Err(PaymentError::StoreUnavailable(_))
        ));
        assert_eq!(store.payment_count().await, 0);
    }

    #[tokio::test]
    async fn test_fail_order_payments_only_touches_that_order() {
        let store = InMemoryPaymentStore::new();
        let order = OrderId::new();
        let other = OrderId::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert(&Payment::new(order, Money::from_cents(100), "u1"))
            .await
            .unwrap();
        tx.insert(&Payment::new(other, Money::from_cents(100), "u2"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.fail_order_payments(order).await.unwrap(), 1);
        assert_eq!(store.fail_order_payments(order).await.unwrap(), 0);

        let others = store.payments_for_order(other).await.unwrap();
        assert_eq!(others[0].status, PaymentStatus::Processing);
    }
}
