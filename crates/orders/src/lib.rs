//! Order capture for the order fulfillment saga.
//!
//! An order is persisted as `pending` together with its line items and then
//! handed to a [`FulfillmentHandoff`], which runs the saga in the background.
//! The saga's final status write is the only mutation an order ever sees.

pub mod error;
pub mod handoff;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod service;
pub mod store;

pub use error::{OrderError, Result};
pub use handoff::FulfillmentHandoff;
pub use memory::InMemoryOrderStore;
pub use model::{CreateOrderRequest, Order, OrderStatus};
pub use postgres::PostgresOrderStore;
pub use service::OrderService;
pub use store::OrderStore;
