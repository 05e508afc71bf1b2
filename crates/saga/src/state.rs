//! Saga state machine and per-execution context.

use common::{OrderId, StockLine};
use serde::{Deserialize, Serialize};

use crate::steps::SagaStep;

/// Where a saga execution is.
///
/// ```text
/// not_started ─► running ─┬─► completed
///                         └─► compensating ─► failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SagaState {
    #[default]
    NotStarted,
    /// Forward steps are being executed.
    Running,
    /// A step failed; completed steps are being undone.
    Compensating,
    Completed,
    /// Compensation has run after a failed step.
    Failed,
}

impl SagaState {
    fn can_run(&self) -> bool {
        *self == SagaState::NotStarted
    }

    fn can_compensate(&self) -> bool {
        *self == SagaState::Running
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Completed | SagaState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "not_started",
            SagaState::Running => "running",
            SagaState::Compensating => "compensating",
            SagaState::Completed => "completed",
            SagaState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one coordinator execution has done so far.
///
/// Lives only for the duration of a single run; nothing here is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SagaContext {
    order_id: OrderId,
    state: SagaState,
    reserved: Vec<StockLine>,
    completed_steps: Vec<SagaStep>,
    failed_step: Option<SagaStep>,
    failure: Option<String>,
}

impl SagaContext {
    /// Creates a context for a saga that has not started.
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            state: SagaState::NotStarted,
            reserved: Vec::new(),
            completed_steps: Vec::new(),
            failed_step: None,
            failure: None,
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    /// The stock lines reserved by the inventory step, if it completed.
    pub fn reserved(&self) -> &[StockLine] {
        &self.reserved
    }

    pub fn completed_steps(&self) -> &[SagaStep] {
        &self.completed_steps
    }

    pub fn failed_step(&self) -> Option<SagaStep> {
        self.failed_step
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Moves `NotStarted` to `Running`; later calls are ignored.
    pub fn start(&mut self) {
        if self.state.can_run() {
            self.state = SagaState::Running;
        }
    }

    /// Records the inventory step with the exact lines it reserved.
    pub fn record_reservation(&mut self, lines: Vec<StockLine>) {
        self.reserved = lines;
        self.step_completed(SagaStep::ReserveInventory);
    }

    /// Records a completed forward step.
    pub fn step_completed(&mut self, step: SagaStep) {
        if self.state == SagaState::Running {
            self.completed_steps.push(step);
        }
    }

    /// Records a failed forward step and switches to compensation.
    pub fn step_failed(&mut self, step: SagaStep, reason: impl Into<String>) {
        if self.state.can_compensate() {
            self.state = SagaState::Compensating;
            self.failed_step = Some(step);
            self.failure = Some(reason.into());
        }
    }

    /// Completed steps in the order their compensations must run.
    pub fn steps_to_compensate(&self) -> Vec<SagaStep> {
        self.completed_steps.iter().rev().copied().collect()
    }

    /// Ends the saga: `Running` becomes `Completed`, `Compensating` becomes `Failed`.
    pub fn finish(&mut self) {
        self.state = match self.state {
            SagaState::Running => SagaState::Completed,
            SagaState::Compensating => SagaState::Failed,
            other => other,
        };
    }
}
