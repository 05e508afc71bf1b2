//! Order fulfillment saga steps.

use serde::{Deserialize, Serialize};

/// A forward step of the order fulfillment saga, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStep {
    /// Reserve stock for every line item. Compensated by a release.
    ReserveInventory,

    /// Take payment for the order amount. Compensated by marking the
    /// order's payments failed.
    ProcessPayment,
}

impl SagaStep {
    /// All steps in the order they run.
    pub const ALL: [SagaStep; 2] = [SagaStep::ReserveInventory, SagaStep::ProcessPayment];

    /// Returns the step name used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStep::ReserveInventory => "reserve_inventory",
            SagaStep::ProcessPayment => "process_payment",
        }
    }
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
