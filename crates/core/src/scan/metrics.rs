use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::Serialize;

/// Counters for one scan
#[derive(Debug, Default)]
pub struct ScanMetrics {
    pages: AtomicU64,
    items: AtomicU64,
    scanned: AtomicU64,
    read_attempts: AtomicU64,
    failed_chains: AtomicU64,
    skipped_tasks: AtomicU64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page the results sink accepted
    pub fn record_page(&self, items: usize, scanned: usize) {
        self.pages.fetch_add(1, AtomicOrdering::Relaxed);
        self.items.fetch_add(items as u64, AtomicOrdering::Relaxed);
        self.scanned.fetch_add(scanned as u64, AtomicOrdering::Relaxed);
    }

    /// Record one call into the segment reader
    pub fn record_read_attempt(&self) {
        self.read_attempts.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record a chain abandoned after a read or sink failure
    pub fn record_failed_chain(&self) {
        self.failed_chains.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record tasks dropped or skipped because of an abort
    pub fn record_skipped(&self, count: u64) {
        self.skipped_tasks.fetch_add(count, AtomicOrdering::Relaxed);
    }

    pub fn snapshot(&self) -> ScanMetricsSnapshot {
        ScanMetricsSnapshot {
            pages: self.pages.load(AtomicOrdering::Relaxed),
            items: self.items.load(AtomicOrdering::Relaxed),
            scanned: self.scanned.load(AtomicOrdering::Relaxed),
            read_attempts: self.read_attempts.load(AtomicOrdering::Relaxed),
            failed_chains: self.failed_chains.load(AtomicOrdering::Relaxed),
            skipped_tasks: self.skipped_tasks.load(AtomicOrdering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanMetricsSnapshot {
    pub pages: u64,
    pub items: u64,
    pub scanned: u64,
    pub read_attempts: u64,
    pub failed_chains: u64,
    pub skipped_tasks: u64,
}
