//! Types shared by the order, inventory and payment services.
//!
//! Everything here crosses a service boundary: identifiers, money amounts,
//! line items and the JSON request bodies the saga sends between services.

pub mod money;
pub mod types;
pub mod wire;

pub use money::Money;
pub use types::{LineItem, OrderId, PaymentId, ProductId, StockLine};
pub use wire::{
    ErrorResponse, MessageResponse, PaymentRequest, PaymentRollbackRequest, ReserveRequest,
};
