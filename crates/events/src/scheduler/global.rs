//! Process-wide scheduler accessor.
//!
//! Hosts should prefer constructing a [`Scheduler`] at their composition root
//! and passing `Arc<Scheduler>` around. This accessor exists for call sites
//! that have no handle to thread through.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use super::runner::Scheduler;

static SCHEDULER: RwLock<Option<Arc<Scheduler>>> = RwLock::new(None);

/// Get or create the process-wide scheduler. Construct-once even when the
/// first calls race.
pub fn get_scheduler() -> Arc<Scheduler> {
    if let Some(existing) = SCHEDULER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return Arc::clone(existing);
    }

    let mut slot = SCHEDULER.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(slot.get_or_insert_with(|| {
        info!("constructing process-wide scheduler");
        Arc::new(Scheduler::default())
    }))
}

/// Discard the process-wide scheduler so the next [`get_scheduler`] call
/// returns a fresh, empty instance. Pending items of the old instance are
/// cleared; handles still held elsewhere keep the (now empty) old instance.
#[cfg(any(test, feature = "test-utils"))]
pub fn reset_scheduler() {
    let previous = SCHEDULER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(previous) = previous {
        previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::scheduler::item::Payload;
    use crate::scheduler::types::Rank;

    // One test owns the global so parallel tests cannot interleave on it.
    #[tokio::test]
    async fn singleton_identity_and_reset() {
        reset_scheduler();

        let first = get_scheduler();
        let second = get_scheduler();
        assert!(Arc::ptr_eq(&first, &second));

        first.submit(Payload::immediate(|| Ok(())), Rank::default(), Duration::ZERO);
        assert_eq!(second.queue_depth(), 1);
        assert_eq!(second.process(None, None).await, 1);

        first.submit(Payload::immediate(|| Ok(())), Rank::default(), Duration::ZERO);
        reset_scheduler();

        let fresh = get_scheduler();
        assert!(!Arc::ptr_eq(&first, &fresh));
        assert_eq!(fresh.queue_depth(), 0);
        assert_eq!(first.queue_depth(), 0);

        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(get_scheduler))
            .collect();
        for handle in handles {
            assert!(Arc::ptr_eq(&handle.join().unwrap(), &fresh));
        }

        reset_scheduler();
    }
}
