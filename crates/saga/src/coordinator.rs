//! Saga coordinator for the order fulfillment saga.

use common::OrderId;
use orders::{Order, OrderStatus, OrderStore};
use serde::Serialize;

use crate::error::SagaError;
use crate::services::inventory::InventoryClient;
use crate::services::payment::PaymentClient;
use crate::state::{SagaContext, SagaState};
use crate::steps::SagaStep;

/// How a saga execution ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagaOutcome {
    pub order_id: OrderId,
    /// The order status written at the end of the saga.
    pub status: OrderStatus,
    pub saga_state: SagaState,
    pub completed_steps: Vec<SagaStep>,
    pub failed_step: Option<SagaStep>,
    pub failure: Option<String>,
}

impl SagaOutcome {
    fn new(ctx: &SagaContext, status: OrderStatus) -> Self {
        Self {
            order_id: ctx.order_id(),
            status,
            saga_state: ctx.state(),
            completed_steps: ctx.completed_steps().to_vec(),
            failed_step: ctx.failed_step(),
            failure: ctx.failure().map(str::to_string),
        }
    }
}

/// Orchestrates the execution of order fulfillment sagas.
///
/// The coordinator drives a 2-step saga (inventory → payment). When a step
/// fails, the steps that already completed are compensated in reverse order
/// and the order is marked `failed`. Step failures never escape `run`; they
/// only show up in the order's final status and the returned outcome.
pub struct SagaCoordinator<O, I, P>
where
    O: OrderStore,
    I: InventoryClient,
    P: PaymentClient,
{
    orders: O,
    inventory: I,
    payment: P,
}

impl<O, I, P> SagaCoordinator<O, I, P>
where
    O: OrderStore,
    I: InventoryClient,
    P: PaymentClient,
{
    /// Creates a new saga coordinator.
    pub fn new(orders: O, inventory: I, payment: P) -> Self {
        Self {
            orders,
            inventory,
            payment,
        }
    }

    /// Returns the order store the coordinator writes final statuses to.
    pub fn orders(&self) -> &O {
        &self.orders
    }

    /// Executes the fulfillment saga for a `pending` order.
    ///
    /// Returns an error only when the final status write fails, in which case
    /// the order is left `pending`.
    #[tracing::instrument(skip(self, order), fields(saga_type = "OrderFulfillment", order_id = %order.id))]
    pub async fn run(&self, order: &Order) -> Result<SagaOutcome, SagaError> {
        metrics::counter!("saga_executions_total").increment(1);
        let saga_start = std::time::Instant::now();

        let mut ctx = SagaContext::new(order.id);
        ctx.start();

        // Step 1: reserve inventory
        let lines = order.stock_lines();
        tracing::info!(step = %SagaStep::ReserveInventory, "saga step started");
        match self.inventory.reserve(order.id, &lines).await {
            Ok(()) => ctx.record_reservation(lines),
            Err(e) => {
                tracing::info!(step = %SagaStep::ReserveInventory, error = %e, "saga step failed");
                ctx.step_failed(SagaStep::ReserveInventory, e.to_string());
            }
        }

        // Step 2: process payment
        if ctx.state() == SagaState::Running {
            tracing::info!(step = %SagaStep::ProcessPayment, "saga step started");
            match self
                .payment
                .process(order.id, order.amount, &order.user_id)
                .await
            {
                Ok(()) => ctx.step_completed(SagaStep::ProcessPayment),
                Err(e) => {
                    tracing::warn!(step = %SagaStep::ProcessPayment, error = %e, "saga step failed");
                    ctx.step_failed(SagaStep::ProcessPayment, e.to_string());
                }
            }
        }

        if ctx.state() == SagaState::Compensating {
            self.compensate(&ctx).await;
        }

        let status = match ctx.state() {
            SagaState::Running => OrderStatus::Completed,
            _ => OrderStatus::Failed,
        };
        ctx.finish();

        let result = self.orders.transition(order.id, status).await;
        let duration = saga_start.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);

        let updated = match result {
            Ok(updated) => updated,
            Err(e) => {
                metrics::counter!("saga_status_write_failures_total").increment(1);
                tracing::error!(error = %e, %status, "could not record saga outcome");
                return Err(e.into());
            }
        };

        match updated.status {
            OrderStatus::Completed => {
                metrics::counter!("saga_completed").increment(1);
                tracing::info!(duration, "saga completed successfully");
            }
            _ => {
                metrics::counter!("saga_failed").increment(1);
                tracing::warn!(
                    duration,
                    failed_step = ?ctx.failed_step(),
                    reason = ctx.failure().unwrap_or("unknown"),
                    "saga failed"
                );
            }
        }

        Ok(SagaOutcome::new(&ctx, updated.status))
    }

    /// Runs compensating actions in reverse order of completed steps.
    ///
    /// Failures are logged and counted, never retried, and do not stop the
    /// remaining compensations.
    async fn compensate(&self, ctx: &SagaContext) {
        let order_id = ctx.order_id();

        for step in ctx.steps_to_compensate() {
            let result = match step {
                SagaStep::ReserveInventory => {
                    self.inventory.release(order_id, ctx.reserved()).await
                }
                SagaStep::ProcessPayment => self.payment.compensate(order_id).await,
            };

            match result {
                Ok(()) => tracing::info!(%step, "compensation step completed"),
                Err(e) => {
                    metrics::counter!("saga_compensation_failures_total", "step" => step.as_str())
                        .increment(1);
                    tracing::error!(%step, error = %e, "compensation step failed");
                }
            }
        }
    }
}
