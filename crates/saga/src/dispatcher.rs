//! Background execution of sagas.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use common::OrderId;
use orders::{FulfillmentHandoff, Order, OrderStore};
use tokio::sync::{broadcast, oneshot};
use tokio::task::{AbortHandle, JoinSet};

use crate::coordinator::{SagaCoordinator, SagaOutcome};
use crate::error::SagaError;
use crate::services::inventory::InventoryClient;
use crate::services::payment::PaymentClient;

const COMPLETION_CHANNEL_CAPACITY: usize = 256;

/// A saga running in the background.
///
/// Dropping the handle detaches the saga; it keeps running.
pub struct SagaHandle {
    order_id: OrderId,
    abort: AbortHandle,
    outcome: oneshot::Receiver<Result<SagaOutcome, SagaError>>,
}

impl SagaHandle {
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Stops the saga at its next suspension point. The order stays `pending`.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Waits for the saga to finish.
    pub async fn outcome(self) -> Result<SagaOutcome, SagaError> {
        self.outcome.await.unwrap_or(Err(SagaError::Cancelled))
    }
}

/// What [`SagaDispatcher::shutdown`] did with the sagas still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Sagas that finished within the timeout.
    pub drained: usize,
    /// Sagas aborted when the timeout expired; their orders stay `pending`.
    pub aborted: usize,
}

/// Counts a saga as in flight until dropped, which also covers aborted tasks.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(count: &Arc<AtomicUsize>) -> Self {
        let now = count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::gauge!("sagas_in_flight").set(now as f64);
        Self(Arc::clone(count))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let now = self.0.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::gauge!("sagas_in_flight").set(now as f64);
    }
}

/// Runs each saga on its own tokio task.
///
/// The order capture request returns as soon as the saga is spawned. Every
/// finished saga publishes its outcome on a broadcast channel (see
/// [`SagaDispatcher::subscribe`]).
pub struct SagaDispatcher<O, I, P>
where
    O: OrderStore,
    I: InventoryClient,
    P: PaymentClient,
{
    coordinator: Arc<SagaCoordinator<O, I, P>>,
    /// `None` once shutdown has started.
    tasks: Mutex<Option<JoinSet<()>>>,
    in_flight: Arc<AtomicUsize>,
    completions: broadcast::Sender<SagaOutcome>,
}

impl<O, I, P> SagaDispatcher<O, I, P>
where
    O: OrderStore + 'static,
    I: InventoryClient + 'static,
    P: PaymentClient + 'static,
{
    /// Creates a dispatcher around a coordinator.
    pub fn new(coordinator: SagaCoordinator<O, I, P>) -> Self {
        let (completions, _) = broadcast::channel(COMPLETION_CHANNEL_CAPACITY);
        Self {
            coordinator: Arc::new(coordinator),
            tasks: Mutex::new(Some(JoinSet::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            completions,
        }
    }

    /// Subscribes to the outcomes of sagas finishing from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SagaOutcome> {
        self.completions.subscribe()
    }

    /// Returns the number of sagas still running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Spawns the saga for `order` and returns without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, order: Order) -> Result<SagaHandle, SagaError> {
        let mut guard = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tasks) = guard.as_mut() else {
            return Err(SagaError::ShuttingDown);
        };

        let order_id = order.id;
        let coordinator = Arc::clone(&self.coordinator);
        let completions = self.completions.clone();
        let (tx, rx) = oneshot::channel();
        let in_flight = InFlight::enter(&self.in_flight);

        // Reap finished sagas so the set only tracks live ones.
        while tasks.try_join_next().is_some() {}

        let abort = tasks.spawn(async move {
            let result = coordinator.run(&order).await;
            drop(in_flight);
            match &result {
                Ok(outcome) => {
                    // No subscribers is fine.
                    let _ = completions.send(outcome.clone());
                }
                Err(e) => tracing::error!(%order_id, error = %e, "saga ended without a final status"),
            }
            let _ = tx.send(result);
        });

        Ok(SagaHandle {
            order_id,
            abort,
            outcome: rx,
        })
    }

    /// Stops accepting sagas, waits up to `timeout` for the running ones, then
    /// aborts whatever is left.
    pub async fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        let taken = self.tasks.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(mut tasks) = taken else {
            return ShutdownReport {
                drained: 0,
                aborted: 0,
            };
        };

        let mut drained = 0;
        let finished = tokio::time::timeout(timeout, async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result
                    && e.is_panic()
                {
                    tracing::error!(error = %e, "saga task panicked");
                }
                drained += 1;
            }
        })
        .await;

        let aborted = if finished.is_err() {
            let remaining = tasks.len();
            tracing::warn!(remaining, "saga shutdown timed out, aborting remaining sagas");
            tasks.shutdown().await;
            remaining
        } else {
            0
        };

        tracing::info!(drained, aborted, "saga dispatcher stopped");
        ShutdownReport { drained, aborted }
    }
}

impl<O, I, P> FulfillmentHandoff for SagaDispatcher<O, I, P>
where
    O: OrderStore + 'static,
    I: InventoryClient + 'static,
    P: PaymentClient + 'static,
{
    fn hand_off(&self, order: Order) {
        let order_id = order.id;
        if let Err(e) = self.dispatch(order) {
            tracing::warn!(%order_id, error = %e, "saga not started; order stays pending");
        }
    }
}
