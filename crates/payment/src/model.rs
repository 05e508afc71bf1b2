//! Payment record and its state machine.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, PaymentId};
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// The state of a payment.
///
/// State transitions:
/// ```text
/// Processing ──┬──► Completed ──► Failed   (compensation)
///              └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Recorded, outcome not yet decided.
    #[default]
    Processing,

    /// Payment accepted.
    Completed,

    /// Payment declined or compensated (terminal state).
    Failed,
}

impl PaymentStatus {
    /// Returns true if the payment can be completed in this state.
    pub fn can_complete(&self) -> bool {
        matches!(self, PaymentStatus::Processing)
    }

    /// Returns true if the payment can be marked failed in this state.
    pub fn can_fail(&self) -> bool {
        matches!(self, PaymentStatus::Processing | PaymentStatus::Completed)
    }

    /// Returns the status name as stored and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(PaymentStatus::Processing),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(PaymentError::UnknownStatus(other.to_string())),
        }
    }
}

/// A payment attempt for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub user_id: String,
    pub amount: Money,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a new payment in the `processing` state.
    pub fn new(order_id: OrderId, amount: Money, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            order_id,
            user_id: user_id.into(),
            amount,
            status: PaymentStatus::Processing,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the payment from `processing` to `completed`.
    pub fn complete(&mut self) -> Result<(), PaymentError> {
        self.transition(PaymentStatus::Completed, self.status.can_complete())
    }

    /// Marks the payment `failed`.
    pub fn fail(&mut self) -> Result<(), PaymentError> {
        self.transition(PaymentStatus::Failed, self.status.can_fail())
    }

    fn transition(&mut self, to: PaymentStatus, allowed: bool) -> Result<(), PaymentError> {
        if !allowed {
            return Err(PaymentError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}
