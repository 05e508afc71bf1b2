use async_trait::async_trait;
use common::OrderId;

use crate::Result;
use crate::model::{Order, OrderStatus};

/// Storage for orders and their line items.
///
/// Every method is atomic on its own; the order store never hands out
/// transactions because no caller needs more than one write at a time.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order together with its line items.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Loads an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Moves an order to `to` and returns the updated order.
    ///
    /// Fails with `NotFound` for an unknown id and `InvalidTransition` when
    /// the stored status does not allow the move.
    async fn transition(&self, id: OrderId, to: OrderStatus) -> Result<Order>;
}
