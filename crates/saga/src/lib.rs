//! Saga pattern implementation for order fulfillment.
//!
//! The order fulfillment saga follows these steps:
//! 1. Reserve inventory
//! 2. Process payment
//!
//! If a step fails, previously completed steps are compensated in reverse
//! order and the order is marked `failed`; otherwise it is marked
//! `completed`. Sagas run in the background on a [`SagaDispatcher`].

pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod services;
pub mod state;
pub mod steps;

pub use coordinator::{SagaCoordinator, SagaOutcome};
pub use dispatcher::{SagaDispatcher, SagaHandle, ShutdownReport};
pub use error::{Result, SagaError};
pub use services::{HttpInventoryClient, HttpPaymentClient, InventoryClient, PaymentClient};
pub use state::{SagaContext, SagaState};
pub use steps::SagaStep;
