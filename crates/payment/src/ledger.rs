//! Payment ledger service.

use common::{Money, OrderId};

use crate::error::{PaymentError, Result};
use crate::model::Payment;
use crate::store::{PaymentStore, PaymentTransaction};

/// Records payment attempts and their outcome.
///
/// There is no gateway behind the ledger, so processing cannot be declined;
/// the only way [`PaymentLedger::process`] fails is an aborted store
/// transaction.
pub struct PaymentLedger<S: PaymentStore> {
    store: S,
}

impl<S: PaymentStore> PaymentLedger<S> {
    /// Creates a new payment ledger over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records a payment for an order and finalises it as completed.
    #[tracing::instrument(skip(self), fields(%order_id, %amount))]
    pub async fn process(&self, order_id: OrderId, amount: Money, user_id: &str) -> Result<Payment> {
        if amount.is_negative() {
            return Err(PaymentError::Validation(
                "amount must not be negative".to_string(),
            ));
        }
        if user_id.trim().is_empty() {
            return Err(PaymentError::Validation(
                "userId must not be empty".to_string(),
            ));
        }

        let mut payment = Payment::new(order_id, amount, user_id);

        let result = async {
            let mut tx = self.store.begin().await?;
            tx.insert(&payment).await?;
            payment.complete()?;
            tx.update_status(payment.id, payment.status, payment.updated_at)
                .await?;
            tx.commit().await
        }
        .await;

        match result {
            Ok(()) => {
                metrics::counter!("payments_processed_total", "outcome" => "completed")
                    .increment(1);
                tracing::info!(payment_id = %payment.id, "payment completed");
                Ok(payment)
            }
            Err(e) => {
                metrics::counter!("payments_processed_total", "outcome" => "error").increment(1);
                tracing::warn!(error = %e, "payment transaction failed");
                Err(e)
            }
        }
    }

    /// Marks every payment of an order failed.
    ///
    /// Idempotent: repeated calls, or calls for an order with no payment,
    /// succeed without changing anything. Returns the number of payments
    /// that changed.
    #[tracing::instrument(skip(self), fields(%order_id))]
    pub async fn compensate(&self, order_id: OrderId) -> Result<u64> {
        let changed = self.store.fail_order_payments(order_id).await?;
        metrics::counter!("payments_compensated_total").increment(changed);
        tracing::info!(changed, "payment rolled back");
        Ok(changed)
    }

    /// Returns every payment of an order, most recent first.
    pub async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>> {
        self.store.payments_for_order(order_id).await
    }
}
