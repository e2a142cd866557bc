//! Mock `SegmentReader` implementations

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use segscan_core::SegmentReader;
use segscan_domain::{ContinuationToken, Item, Page, SegmentRequest, StoreResult};
use serde_json::json;

type Script = dyn Fn(&SegmentRequest, usize) -> StoreResult<Page> + Send + Sync;

/// Reader whose responses come from a script closure.
///
/// The closure receives the request and the zero-based index of the call
/// across all segments. Every request is recorded before the script runs.
pub struct ScriptedReader {
    script: Box<Script>,
    calls: Mutex<Vec<SegmentRequest>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    segments_in_flight: Mutex<Vec<u32>>,
    overlapping_segment_reads: AtomicUsize,
}

impl ScriptedReader {
    pub fn new(
        script: impl Fn(&SegmentRequest, usize) -> StoreResult<Page> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            latency: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            segments_in_flight: Mutex::new(Vec::new()),
            overlapping_segment_reads: AtomicUsize::new(0),
        }
    }

    /// Every segment returns `pages` pages, chained by continuation tokens.
    pub fn paged(pages: u32) -> Self {
        Self::new(move |request, _| Ok(paged_response(request, pages)))
    }

    /// Simulate I/O latency with a timer instead of a single yield.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<SegmentRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for_segment(&self, segment: u32) -> Vec<SegmentRequest> {
        self.calls().into_iter().filter(|call| call.segment == segment).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Reads issued while another read of the same segment was running.
    pub fn overlapping_segment_reads(&self) -> usize {
        self.overlapping_segment_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SegmentReader for ScriptedReader {
    async fn read_segment(&self, request: &SegmentRequest) -> StoreResult<Page> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.clone());
            calls.len() - 1
        };
        {
            let mut segments = self.segments_in_flight.lock().unwrap();
            if segments.contains(&request.segment) {
                self.overlapping_segment_reads.fetch_add(1, Ordering::SeqCst);
            }
            segments.push(request.segment);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        {
            let mut segments = self.segments_in_flight.lock().unwrap();
            if let Some(pos) = segments.iter().position(|s| *s == request.segment) {
                segments.remove(pos);
            }
        }
        (self.script)(request, index)
    }
}

/// Continuation token for `page` of `segment`.
pub fn token(segment: u32, page: u32) -> ContinuationToken {
    let mut key = Item::new();
    key.insert("segment".into(), json!(segment));
    key.insert("page".into(), json!(page));
    ContinuationToken::new(key)
}

/// Which page of its segment a request asks for (0 for the first page).
pub fn page_index(request: &SegmentRequest) -> u32 {
    request
        .exclusive_start
        .as_ref()
        .and_then(|token| token.key().get("page"))
        .and_then(|page| page.as_u64())
        .map_or(0, |page| page as u32 + 1)
}

/// One item page for the requested position; more pages follow until `pages`.
pub fn paged_response(request: &SegmentRequest, pages: u32) -> Page {
    let page = page_index(request);
    let mut item = Item::new();
    item.insert("id".into(), json!(format!("{}-{}", request.segment, page)));
    item.insert("segment".into(), json!(request.segment));
    item.insert("page".into(), json!(page));

    let continuation = (page + 1 < pages).then(|| token(request.segment, page));
    Page::new(vec![item]).with_continuation(continuation)
}

pub fn shared(reader: ScriptedReader) -> Arc<ScriptedReader> {
    Arc::new(reader)
}
