//! Per-callback scan context and the shared abort capability

use std::fmt;
use std::sync::Arc;

use segscan_domain::ContinuationToken;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::metrics::ScanMetrics;
use super::queue::WorkQueue;

/// Cloneable handle that aborts a running scan
///
/// Aborting is monotonic and idempotent. Pending tasks are dropped at once;
/// a read already in flight finishes but its page is discarded.
#[derive(Clone)]
pub struct AbortHandle {
    cancel: CancellationToken,
    queue: Arc<WorkQueue>,
    metrics: Arc<ScanMetrics>,
}

impl AbortHandle {
    pub(crate) fn new(queue: Arc<WorkQueue>, metrics: Arc<ScanMetrics>) -> Self {
        Self { cancel: CancellationToken::new(), queue, metrics }
    }

    /// Stop scheduling further reads
    pub fn abort(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        let dropped = self.queue.clear();
        self.metrics.record_skipped(dropped as u64);
        info!(dropped_tasks = dropped, "Scan aborted");
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token cancelled on abort, for callers that want to `select!` on it
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl fmt::Debug for AbortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortHandle").field("aborted", &self.is_aborted()).finish()
    }
}

/// Read-only view of the task a callback is invoked for
#[derive(Debug, Clone)]
pub struct ScanContext {
    segment: u32,
    total_segments: u32,
    continuation: Option<ContinuationToken>,
    abort: AbortHandle,
}

impl ScanContext {
    pub(crate) fn new(
        segment: u32,
        total_segments: u32,
        continuation: Option<ContinuationToken>,
        abort: AbortHandle,
    ) -> Self {
        Self { segment, total_segments, continuation, abort }
    }

    /// Segment index of the page
    pub fn segment(&self) -> u32 {
        self.segment
    }

    pub fn total_segments(&self) -> u32 {
        self.total_segments
    }

    /// Token the page was read from; `None` for a segment's first page
    pub fn continuation(&self) -> Option<&ContinuationToken> {
        self.continuation.as_ref()
    }

    /// Abort the whole scan, not just this segment
    pub fn abort(&self) {
        self.abort.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }

    pub fn abort_handle(&self) -> &AbortHandle {
        &self.abort
    }
}
