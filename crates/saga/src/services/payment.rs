//! Payment step port.

use std::sync::Arc;

use async_trait::async_trait;
use common::{Money, OrderId, PaymentRequest, PaymentRollbackRequest};
use payment::{PaymentLedger, PaymentStore};
use reqwest::Client;

use super::check_response;
use crate::error::SagaError;

/// Payment operations the saga needs.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Takes payment for the order.
    async fn process(&self, order_id: OrderId, amount: Money, user_id: &str)
    -> Result<(), SagaError>;

    /// Marks every payment of the order failed.
    async fn compensate(&self, order_id: OrderId) -> Result<(), SagaError>;
}

#[async_trait]
impl<T: PaymentClient + ?Sized> PaymentClient for Arc<T> {
    async fn process(
        &self,
        order_id: OrderId,
        amount: Money,
        user_id: &str,
    ) -> Result<(), SagaError> {
        (**self).process(order_id, amount, user_id).await
    }

    async fn compensate(&self, order_id: OrderId) -> Result<(), SagaError> {
        (**self).compensate(order_id).await
    }
}

/// Calls a [`PaymentLedger`] running in the same process.
#[async_trait]
impl<S: PaymentStore> PaymentClient for PaymentLedger<S> {
    async fn process(
        &self,
        order_id: OrderId,
        amount: Money,
        user_id: &str,
    ) -> Result<(), SagaError> {
        PaymentLedger::process(self, order_id, amount, user_id).await?;
        Ok(())
    }

    async fn compensate(&self, order_id: OrderId) -> Result<(), SagaError> {
        PaymentLedger::compensate(self, order_id).await?;
        Ok(())
    }
}

/// Calls the payment service over HTTP.
#[derive(Clone)]
pub struct HttpPaymentClient {
    client: Client,
    base_url: String,
}

impl HttpPaymentClient {
    /// Creates a client for the payment service at `base_url`
    /// (e.g. `http://localhost:8082`).
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PaymentClient for HttpPaymentClient {
    async fn process(
        &self,
        order_id: OrderId,
        amount: Money,
        user_id: &str,
    ) -> Result<(), SagaError> {
        let request = PaymentRequest {
            order_id,
            amount,
            user_id: user_id.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/payments/process", self.base_url))
            .json(&request)
            .send()
            .await?;

        check_response("payment", response).await?;
        Ok(())
    }

    async fn compensate(&self, order_id: OrderId) -> Result<(), SagaError> {
        let response = self
            .client
            .post(format!("{}/api/payments/rollback", self.base_url))
            .json(&PaymentRollbackRequest { order_id })
            .send()
            .await?;

        check_response("payment", response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payment::{InMemoryPaymentStore, PaymentError};

    #[tokio::test]
    async fn test_in_process_client_maps_errors() {
        let ledger = PaymentLedger::new(InMemoryPaymentStore::new());
        ledger.store().set_fail_on_commit(true);
        let client: Arc<dyn PaymentClient> = Arc::new(ledger);

        let err = client
            .process(OrderId::new(), Money::from_cents(100), "u1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SagaError::Payment(PaymentError::StoreUnavailable(_))
        ));
        client.compensate(OrderId::new()).await.unwrap();
    }
}
