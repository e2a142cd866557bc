//! The scan orchestrator
//!
//! `start` seeds one task per segment and spawns one worker per segment on
//! the current tokio runtime. Workers pull tasks from the shared
//! [`WorkQueue`] until it is idle. A task reads one page, delivers it, and
//! re-enqueues its segment when the page has a continuation token, so a
//! segment never has two reads in flight and its pages are delivered in order.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use segscan_common::{RetryExecutor, RetryResult};
use segscan_domain::{Page, ScanRequest, StoreError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::config::{ScanConfig, SharedRetryPolicy};
use super::context::{AbortHandle, ScanContext};
use super::error::{ScanConfigError, ScanError};
use super::metrics::{ScanMetrics, ScanMetricsSnapshot};
use super::queue::{SegmentTask, WorkQueue};
use crate::ports::{ErrorSink, PageSink, SegmentReader};

/// State shared by every worker of one scan
struct ScanShared {
    reader: Arc<dyn SegmentReader>,
    request: ScanRequest,
    on_page: Arc<dyn PageSink>,
    on_error: Option<Arc<dyn ErrorSink>>,
    total_segments: u32,
    executor: RetryExecutor<SharedRetryPolicy>,
    queue: Arc<WorkQueue>,
    abort: AbortHandle,
    metrics: Arc<ScanMetrics>,
}

/// A parallel segmented scan
///
/// ```rust,ignore
/// let scanner = Scanner::new(config);
/// scanner.start()?;
/// let abort = scanner.abort_handle();
/// scanner.on_idle().await;
/// ```
pub struct Scanner {
    shared: Arc<ScanShared>,
    started: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        let queue = Arc::new(WorkQueue::new());
        let metrics = Arc::new(ScanMetrics::new());
        let abort = AbortHandle::new(Arc::clone(&queue), Arc::clone(&metrics));

        let shared = ScanShared {
            reader: config.reader,
            request: config.request,
            on_page: config.on_page,
            on_error: config.on_error,
            total_segments: config.total_segments,
            executor: RetryExecutor::new(config.retry, config.retry_policy),
            queue,
            abort,
            metrics,
        };

        Self { shared: Arc::new(shared), started: AtomicBool::new(false), workers: Mutex::new(Vec::new()) }
    }

    /// Seed one task per segment and spawn the workers
    ///
    /// Idempotent: only the first call schedules work. Must be called from
    /// within a tokio runtime.
    #[instrument(skip(self), fields(total_segments = self.shared.total_segments))]
    pub fn start(&self) -> Result<(), ScanConfigError> {
        let runtime = Handle::try_current().map_err(|_| ScanConfigError::MissingRuntime)?;

        if self.started.swap(true, Ordering::AcqRel) {
            debug!("Scan already started");
            return Ok(());
        }
        if self.shared.abort.is_aborted() {
            info!("Scan aborted before start; nothing scheduled");
            return Ok(());
        }

        let total = self.shared.total_segments;
        for segment in 0..total {
            self.shared.queue.push(SegmentTask::initial(segment));
        }

        let mut workers = self.workers.lock();
        for slot in 0..total {
            let shared = Arc::clone(&self.shared);
            workers.push(runtime.spawn(worker_loop(shared, slot)));
        }

        info!(collection = %self.shared.request.collection, "Scan started");
        Ok(())
    }

    /// Abort the scan; see [`AbortHandle::abort`]
    pub fn abort(&self) {
        self.shared.abort.abort();
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.shared.abort.clone()
    }

    pub fn is_aborted(&self) -> bool {
        self.shared.abort.is_aborted()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> ScanMetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Resolve once no task is pending or in flight
    ///
    /// Resolves immediately before `start`. Never fails: per-task errors go
    /// to the error sink.
    pub async fn on_idle(&self) {
        self.shared.queue.idle().await;

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(err) = worker.await {
                error!(error = %err, "Scan worker terminated abnormally");
            }
        }
    }
}

/// Validate `config`, run the scan to completion and return its counters
pub async fn parallel_scan(config: ScanConfig) -> Result<ScanMetricsSnapshot, ScanConfigError> {
    config.validate()?;
    let scanner = Scanner::new(config);
    scanner.start()?;
    scanner.on_idle().await;

    let metrics = scanner.metrics();
    info!(
        pages = metrics.pages,
        items = metrics.items,
        scanned = metrics.scanned,
        failed_chains = metrics.failed_chains,
        "Scan finished"
    );
    Ok(metrics)
}

async fn worker_loop(shared: Arc<ScanShared>, slot: u32) {
    while let Some(in_flight) = shared.queue.next().await {
        let task = in_flight.task();
        let outcome = AssertUnwindSafe(shared.run_task(task)).catch_unwind().await;
        if let Err(panic) = outcome {
            error!(
                segment = task.segment,
                panic = panic_message(panic.as_ref()),
                "Segment task panicked; abandoning chain"
            );
            shared.metrics.record_failed_chain();
        }
    }
    debug!(slot, "Scan worker finished");
}

impl ScanShared {
    #[instrument(
        name = "segment_task",
        skip(self, task),
        fields(segment = task.segment, resumed = task.continuation.is_some())
    )]
    async fn run_task(&self, task: &SegmentTask) {
        if self.abort.is_aborted() {
            self.metrics.record_skipped(1);
            return;
        }

        let request =
            self.request.for_segment(task.segment, self.total_segments, task.continuation.clone());
        let context = ScanContext::new(
            task.segment,
            self.total_segments,
            task.continuation.clone(),
            self.abort.clone(),
        );

        let page = match self.read(&request).await {
            Ok(Some(page)) => page,
            Ok(None) => {
                debug!("Read skipped after abort");
                self.metrics.record_skipped(1);
                return;
            }
            Err(err) => {
                self.report(context, ScanError::from_retry(err)).await;
                return;
            }
        };

        if self.abort.is_aborted() {
            debug!(items = page.count, "Discarding page read before abort");
            return;
        }

        let (items, scanned) = (page.count, page.scanned_count);
        let next = page.continuation.clone();

        if let Err(source) = self.on_page.on_page(context.clone(), page).await {
            self.report(context, ScanError::Sink { source }).await;
            return;
        }
        self.metrics.record_page(items, scanned);
        debug!(items, scanned, has_more = next.is_some(), "Page delivered");

        if let Some(token) = next {
            if !self.abort.is_aborted() {
                self.queue.push(SegmentTask::resume(task.segment, token));
            }
        }
    }

    /// Read one page through the retry executor
    ///
    /// Attempts started after an abort resolve to `None` without reading.
    async fn read(
        &self,
        request: &segscan_domain::SegmentRequest,
    ) -> RetryResult<Option<Page>, StoreError> {
        self.executor
            .execute(|| async move {
                if self.abort.is_aborted() {
                    return Ok(None);
                }
                self.metrics.record_read_attempt();
                self.reader.read_segment(request).await.map(Some)
            })
            .await
    }

    async fn report(&self, context: ScanContext, error: ScanError) {
        self.metrics.record_failed_chain();
        let segment = context.segment();

        let Some(sink) = &self.on_error else {
            debug!(segment, error = %error, "Segment chain failed; no error sink configured");
            return;
        };

        debug!(segment, error = %error, "Segment chain failed");
        if let Err(sink_error) = sink.on_error(context, error).await {
            warn!(segment, error = %sink_error, "Error sink failed; dropping error");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
