use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::error::{OrderError, Result};
use crate::model::{Order, OrderStatus};
use crate::store::OrderStore;

/// In-memory order store for tests and database-less runs.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn transition(&self, id: OrderId, to: OrderStatus) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(OrderError::NotFound(id))?;
        order.transition(to)?;
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{LineItem, Money};

    fn order() -> Order {
        Order::new(
            "u1",
            Money::from_cents(5000),
            vec![LineItem::new("p1", 3, Money::from_cents(1000))],
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryOrderStore::new();
        let order = order();

        store.insert(&order).await.unwrap();

        assert_eq!(store.get(order.id).await.unwrap(), Some(order));
        assert_eq!(store.get(OrderId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_transition_is_persisted() {
        let store = InMemoryOrderStore::new();
        let order = order();
        store.insert(&order).await.unwrap();

        let updated = store
            .transition(order.id, OrderStatus::Completed)
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_transition_from_terminal_is_rejected() {
        let store = InMemoryOrderStore::new();
        let order = order();
        store.insert(&order).await.unwrap();
        store.transition(order.id, OrderStatus::Failed).await.unwrap();

        let result = store.transition(order.id, OrderStatus::Completed).await;

        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Failed);
    }

    #[tokio::test]
    async fn test_transition_unknown_order() {
        let store = InMemoryOrderStore::new();
        let result = store.transition(OrderId::new(), OrderStatus::Failed).await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }
}
