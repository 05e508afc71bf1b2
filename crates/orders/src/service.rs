//! Order capture service.

use std::sync::Arc;

use common::OrderId;

use crate::error::{OrderError, Result};
use crate::handoff::FulfillmentHandoff;
use crate::model::{CreateOrderRequest, Order};
use crate::store::OrderStore;

/// Captures orders and starts their fulfillment.
pub struct OrderService<S: OrderStore> {
    store: S,
    handoff: Arc<dyn FulfillmentHandoff>,
}

impl<S: OrderStore> OrderService<S> {
    /// Creates a new order service.
    pub fn new(store: S, handoff: Arc<dyn FulfillmentHandoff>) -> Self {
        Self { store, handoff }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and persists a new `pending` order, then hands it off for
    /// fulfillment without waiting.
    ///
    /// The returned order is always `pending`; the saga's outcome is only
    /// visible through [`OrderService::get_order`].
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order> {
        if let Err(e) = request.validate() {
            metrics::counter!("orders_rejected_total").increment(1);
            return Err(e);
        }

        let order = Order::from(request);
        self.store.insert(&order).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, lines = order.line_items.len(), "order created");

        self.handoff.hand_off(order.clone());
        Ok(order)
    }

    /// Returns an order by id.
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.store.get(id).await?.ok_or(OrderError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use common::{LineItem, Money};

    use super::*;
    use crate::{InMemoryOrderStore, OrderStatus};

    #[derive(Default)]
    struct RecordingHandoff {
        orders: Mutex<Vec<Order>>,
    }

    impl FulfillmentHandoff for RecordingHandoff {
        fn hand_off(&self, order: Order) {
            self.orders.lock().unwrap().push(order);
        }
    }

    fn service() -> (OrderService<InMemoryOrderStore>, Arc<RecordingHandoff>) {
        let handoff = Arc::new(RecordingHandoff::default());
        let service = OrderService::new(InMemoryOrderStore::new(), handoff.clone());
        (service, handoff)
    }

    fn request() -> CreateOrderRequest {
        CreateOrderRequest::new(
            "u1",
            Money::from_cents(5000),
            vec![LineItem::new("p1", 3, Money::from_cents(1000))],
        )
    }

    #[tokio::test]
    async fn test_create_order_persists_pending_and_hands_off() {
        let (service, handoff) = service();

        let order = service.create_order(request()).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(service.get_order(order.id).await.unwrap(), order);
        assert_eq!(*handoff.orders.lock().unwrap(), vec![order]);
    }

    #[tokio::test]
    async fn test_invalid_order_is_neither_stored_nor_handed_off() {
        let (service, handoff) = service();
        let mut request = request();
        request.line_items.clear();

        let result = service.create_order(request).await;

        assert!(matches!(result, Err(OrderError::Validation(_))));
        assert_eq!(service.store().order_count().await, 0);
        assert!(handoff.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_order() {
        let (service, _) = service();
        let result = service.get_order(OrderId::new()).await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_each_order_gets_a_fresh_id() {
        let (service, _) = service();
        let a = service.create_order(request()).await.unwrap();
        let b = service.create_order(request()).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
