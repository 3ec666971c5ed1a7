//! Ready queue: a max-heap of work items by urgency.

use std::collections::BinaryHeap;

use tokio::time::Instant;

use crate::error::SchedulerError;

use super::item::WorkItem;

/// In-memory priority heap of pending work.
///
/// Pops the highest rank first, breaking ties by earlier due time and then
/// by submission order. Owned exclusively by the scheduler.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    heap: BinaryHeap<WorkItem>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: WorkItem) {
        self.heap.push(item);
    }

    /// Remove and return the most urgent item.
    pub fn pop_min(&mut self) -> Result<WorkItem, SchedulerError> {
        self.heap.pop().ok_or(SchedulerError::EmptyQueue)
    }

    /// Earliest due time among pending items, for driver back-off.
    ///
    /// The heap is ordered by rank first, so this scans every item: O(n)
    /// per call.
    pub fn peek_due_at(&self) -> Option<Instant> {
        self.heap.iter().map(|item| item.due_at).min()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every pending item, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let discarded = self.heap.len();
        self.heap.clear();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::scheduler::item::{Command, Job};
    use crate::scheduler::types::Rank;

    fn item(rank: i32, due_at: Instant, seq: u64) -> WorkItem {
        WorkItem {
            rank: Rank(rank),
            due_at,
            seq,
            enqueued_at: Utc::now(),
            label: format!("item-{seq}"),
            job: Job::Command(Command::new("noop")),
        }
    }

    #[test]
    fn pops_by_rank_then_due_time() {
        let now = Instant::now();
        let mut queue = ReadyQueue::new();
        queue.push(item(10, now, 0));
        queue.push(item(20, now + Duration::from_secs(1), 1));
        queue.push(item(5, now, 2));
        queue.push(item(10, now - Duration::from_millis(10), 3));

        let order: Vec<u64> = std::iter::from_fn(|| queue.pop_min().ok())
            .map(|i| i.seq)
            .collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn pop_on_empty_queue_fails() {
        let mut queue = ReadyQueue::new();
        assert!(matches!(queue.pop_min(), Err(SchedulerError::EmptyQueue)));
    }

    #[test]
    fn peek_due_at_reports_earliest_pending() {
        let now = Instant::now();
        let mut queue = ReadyQueue::new();
        assert!(queue.peek_due_at().is_none());

        queue.push(item(100, now + Duration::from_millis(500), 0));
        queue.push(item(0, now + Duration::from_millis(100), 1));
        assert_eq!(queue.peek_due_at(), Some(now + Duration::from_millis(100)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn requeue_during_drain_keeps_every_item() {
        let now = Instant::now();
        let mut queue = ReadyQueue::new();
        for seq in 0..4 {
            queue.push(item(seq as i32, now, seq));
        }

        let mut set_aside = Vec::new();
        while let Ok(popped) = queue.pop_min() {
            set_aside.push(popped);
        }
        for popped in set_aside {
            queue.push(popped);
        }
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.pop_min().unwrap().seq, 3);
    }

    #[test]
    fn clear_discards_everything() {
        let mut queue = ReadyQueue::new();
        queue.push(item(1, Instant::now(), 0));
        queue.push(item(2, Instant::now(), 1));
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert!(queue.peek_due_at().is_none());
    }
}
