use crate::model::Order;

/// Receives freshly persisted orders for fulfillment.
///
/// Implementations must not block: the order capture service calls this on
/// the request path, after the order has been committed, and returns to the
/// caller without waiting for the outcome.
pub trait FulfillmentHandoff: Send + Sync {
    /// Starts fulfillment of a `pending` order.
    fn hand_off(&self, order: Order);
}
