//! Inventory reservation for the order fulfillment saga.
//!
//! The [`InventoryService`] decrements stock for every line of a request
//! inside one store transaction, holding an exclusive lock on each product
//! row from the read through the write, so concurrent orders contending for
//! the same product can never oversell it. [`InventoryService::release`] is
//! the compensating action: an unconditional increment.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod service;
pub mod store;

pub use error::{InventoryError, Result};
pub use memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
pub use service::InventoryService;
pub use store::{InventoryStore, InventoryTransaction};
