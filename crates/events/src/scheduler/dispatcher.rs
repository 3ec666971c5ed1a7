//! Executes a single payload, isolated from the rest of the batch.

use std::any::Any;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{debug, warn};

use crate::error::{DispatchCause, DispatchError};

use super::item::Payload;
use super::types::{Rank, bucket_for};

/// Runs payloads on the right execution context.
///
/// Immediate payloads go to tokio's blocking pool, bounded by a semaphore so
/// a burst of slow handlers cannot take every blocking thread. Suspendable
/// payloads are spawned on the runtime and awaited. Errors and panics come
/// back as [`DispatchError`]; nothing escapes.
pub struct Dispatcher {
    blocking_slots: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(worker_threads: usize) -> Self {
        Self {
            blocking_slots: Arc::new(Semaphore::new(worker_threads.max(1))),
        }
    }

    /// Blocking-pool slots currently free.
    pub fn available_slots(&self) -> usize {
        self.blocking_slots.available_permits()
    }

    /// Run `payload` to completion and report how it ended.
    pub async fn execute(
        &self,
        label: &str,
        rank: Rank,
        payload: Payload,
    ) -> Result<(), DispatchError> {
        debug!(item = %label, rank = %rank, kind = payload.kind(), "dispatching");

        let outcome = match payload {
            Payload::Immediate(work) => {
                let permit = match Arc::clone(&self.blocking_slots).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return Err(self.fail(label, rank, DispatchCause::Cancelled));
                    }
                };
                tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    work()
                })
                .await
            }
            Payload::Suspendable(work) => tokio::spawn(async move { work().await }).await,
        };

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(self.fail(label, rank, DispatchCause::Failed(format!("{e:#}")))),
            Err(join) => Err(self.fail(label, rank, cause_from_join(join))),
        }
    }

    fn fail(&self, label: &str, rank: Rank, cause: DispatchCause) -> DispatchError {
        let err = DispatchError::new(label, rank, cause);
        warn!(
            item = %err.item,
            system = %bucket_for(rank),
            timestamp = %err.timestamp,
            error = %err.cause,
            "work item failed; continuing batch"
        );
        err
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(1)
    }
}

fn cause_from_join(join: JoinError) -> DispatchCause {
    if join.is_panic() {
        DispatchCause::Panicked(panic_message(join.into_panic()))
    } else {
        DispatchCause::Cancelled
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn immediate_payload_runs() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let dispatcher = Dispatcher::new(2);

        dispatcher
            .execute(
                "ok",
                Rank(0),
                Payload::immediate(move || {
                    h.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.available_slots(), 2);
    }

    #[tokio::test]
    async fn suspendable_payload_is_awaited() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let dispatcher = Dispatcher::default();

        dispatcher
            .execute(
                "async",
                Rank(60),
                Payload::suspendable(move || async move {
                    tokio::task::yield_now().await;
                    h.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn returned_error_becomes_dispatch_error() {
        let err = Dispatcher::default()
            .execute(
                "bad",
                Rank(80),
                Payload::immediate(|| Err(anyhow::anyhow!("grid offline"))),
            )
            .await
            .unwrap_err();

        assert_eq!(err.item, "bad");
        assert_eq!(err.rank, Rank(80));
        assert_eq!(err.cause, DispatchCause::Failed("grid offline".into()));
    }

    #[tokio::test]
    async fn panics_are_caught() {
        let dispatcher = Dispatcher::default();

        let err = dispatcher
            .execute("sync-panic", Rank(0), Payload::immediate(|| panic!("reactor breach")))
            .await
            .unwrap_err();
        assert_eq!(err.cause, DispatchCause::Panicked("reactor breach".into()));

        let err = dispatcher
            .execute(
                "async-panic",
                Rank(0),
                Payload::suspendable(|| async {
                    let deck = 7;
                    if deck > 0 {
                        panic!("hull breach on deck {deck}");
                    }
                    Ok(())
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.cause, DispatchCause::Panicked("hull breach on deck 7".into()));

        // The permit held by the panicking blocking task is released.
        assert_eq!(dispatcher.available_slots(), 1);
    }
}
