//! Work queue shared by the scan workers
//!
//! Pending tasks and the in-flight count live under one lock so idleness is
//! observed atomically: a continuation is pushed before its parent task is
//! marked complete, so the queue never looks idle while a chain is alive.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use segscan_domain::ContinuationToken;
use tokio::sync::Notify;

/// One unit of work: read the next page of `segment`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SegmentTask {
    pub(crate) segment: u32,
    pub(crate) continuation: Option<ContinuationToken>,
}

impl SegmentTask {
    pub(crate) fn initial(segment: u32) -> Self {
        Self { segment, continuation: None }
    }

    pub(crate) fn resume(segment: u32, token: ContinuationToken) -> Self {
        Self { segment, continuation: Some(token) }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<SegmentTask>,
    in_flight: usize,
}

impl QueueState {
    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight == 0
    }
}

#[derive(Debug, Default)]
pub(crate) struct WorkQueue {
    state: Mutex<QueueState>,
    changed: Notify,
}

impl WorkQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a task at the back of the queue
    pub(crate) fn push(&self, task: SegmentTask) {
        self.state.lock().pending.push_back(task);
        self.changed.notify_waiters();
    }

    /// Take the next task, waiting while other tasks are in flight
    ///
    /// Returns `None` once the queue is idle: nothing pending and nothing in
    /// flight that could enqueue more work.
    pub(crate) async fn next(self: &Arc<Self>) -> Option<InFlight> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register before inspecting state so a concurrent push or
            // completion between the check and the await is not lost.
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(task) = state.pending.pop_front() {
                    state.in_flight += 1;
                    return Some(InFlight { queue: Arc::clone(self), task });
                }
                if state.in_flight == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Resolve once nothing is pending or in flight
    pub(crate) async fn idle(&self) {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.state.lock().is_idle() {
                return;
            }

            notified.await;
        }
    }

    /// Drop every pending task, returning how many were dropped
    pub(crate) fn clear(&self) -> usize {
        let dropped = {
            let mut state = self.state.lock();
            let dropped = state.pending.len();
            state.pending.clear();
            dropped
        };
        self.changed.notify_waiters();
        dropped
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.state.lock().is_idle()
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn complete(&self) {
        {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.changed.notify_waiters();
    }
}

/// A dequeued task; marks it complete when dropped
#[derive(Debug)]
pub(crate) struct InFlight {
    queue: Arc<WorkQueue>,
    task: SegmentTask,
}

impl InFlight {
    pub(crate) fn task(&self) -> &SegmentTask {
        &self.task
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.queue.complete();
    }
}
