#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use segscan_common::BoxedError;
use segscan_core::{ErrorSink, PageSink, ScanContext, ScanError, SegmentReader};
use segscan_domain::{Item, Page, SegmentRequest, StoreError, StoreResult};
use segscan_infra::MemoryTable;
use serde_json::{json, Value};

/// Table `pets` keyed by `id` with `count` items, every seventh one a dog.
pub fn pets_table(count: usize) -> Arc<MemoryTable> {
    let items = (0..count).map(|i| {
        let kind = if i % 7 == 0 { "dog" } else { "cat" };
        object(json!({ "id": format!("pet-{i:04}"), "kind": kind, "age": i % 15 }))
    });
    Arc::new(MemoryTable::new("pets", "id").with_items(items).expect("items carry keys"))
}

pub fn object(value: Value) -> Item {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// Page sink collecting every delivered item with its segment.
#[derive(Default)]
pub struct CollectingSink {
    delivered: Mutex<Vec<(u32, Page)>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pages(&self) -> Vec<(u32, Page)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.pages()
            .iter()
            .flat_map(|(_, page)| page.items.iter())
            .filter_map(|item| item.get("id").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    pub fn scanned_total(&self) -> usize {
        self.pages().iter().map(|(_, page)| page.scanned_count).sum()
    }
}

#[async_trait]
impl PageSink for CollectingSink {
    async fn on_page(&self, context: ScanContext, page: Page) -> Result<(), BoxedError> {
        self.delivered.lock().unwrap().push((context.segment(), page));
        Ok(())
    }
}

/// Error sink keeping `(segment, error)` pairs.
#[derive(Default)]
pub struct CollectingErrors {
    errors: Mutex<Vec<(u32, ScanError)>>,
}

impl CollectingErrors {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<(u32, ScanError)> {
        std::mem::take(&mut *self.errors.lock().unwrap())
    }
}

#[async_trait]
impl ErrorSink for CollectingErrors {
    async fn on_error(&self, context: ScanContext, error: ScanError) -> Result<(), BoxedError> {
        self.errors.lock().unwrap().push((context.segment(), error));
        Ok(())
    }
}

/// Reader throttling the first `failures` attempts of every distinct request.
pub struct FlakyReader {
    inner: Arc<MemoryTable>,
    failures: usize,
    attempts: Mutex<HashMap<String, usize>>,
    total_calls: AtomicUsize,
}

impl FlakyReader {
    pub fn new(inner: Arc<MemoryTable>, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            failures,
            attempts: Mutex::new(HashMap::new()),
            total_calls: AtomicUsize::new(0),
        })
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SegmentReader for FlakyReader {
    async fn read_segment(&self, request: &SegmentRequest) -> StoreResult<Page> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let key = serde_json::to_string(request).expect("requests serialize");
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let counter = attempts.entry(key).or_insert(0);
            *counter += 1;
            *counter
        };

        if attempt <= self.failures {
            return Err(StoreError::Throttled(format!("attempt {attempt}")));
        }
        self.inner.read_segment(request).await
    }
}
