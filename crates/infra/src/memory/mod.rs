//! In-memory segmented store
//!
//! [`MemoryTable`] keeps items ordered by their key attribute and assigns
//! each one to a segment by hashing that key, so a parallel scan over any
//! segment count visits every item exactly once. Pages honour the request's
//! limit as a count of examined items, the way a store that filters after
//! reading does: `scanned_count` reports examined items, `count` the ones
//! that passed the filter.

mod expression;

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::ops::Bound;

use async_trait::async_trait;
use parking_lot::RwLock;
use segscan_core::SegmentReader;
use segscan_domain::{ContinuationToken, Item, Page, SegmentRequest, StoreError, StoreResult};
use serde_json::Value;
use tracing::debug;

pub use expression::{Filter, Projection};

/// A named collection of items held in memory
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    key_attribute: String,
    items: RwLock<BTreeMap<String, Item>>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>, key_attribute: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_attribute: key_attribute.into(),
            items: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert `items`, see [`insert`](Self::insert)
    pub fn with_items(self, items: impl IntoIterator<Item = Item>) -> StoreResult<Self> {
        for item in items {
            self.insert(item)?;
        }
        Ok(self)
    }

    /// Insert or replace an item
    ///
    /// # Errors
    /// [`StoreError::InvalidRequest`] if the item has no string or number key
    /// attribute.
    pub fn insert(&self, item: Item) -> StoreResult<()> {
        let key = item
            .get(&self.key_attribute)
            .and_then(key_string)
            .ok_or_else(|| {
                StoreError::InvalidRequest(format!(
                    "item has no usable key attribute '{}'",
                    self.key_attribute
                ))
            })?;
        self.items.write().insert(key, item);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_attribute(&self) -> &str {
        &self.key_attribute
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Segment that owns the item keyed by `key` in a scan of `total_segments`
    pub fn segment_of(key: &str, total_segments: u32) -> u32 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % u64::from(total_segments.max(1))) as u32
    }

    fn start_key(&self, token: Option<&ContinuationToken>) -> StoreResult<Option<String>> {
        let Some(token) = token else {
            return Ok(None);
        };
        token.key().get(&self.key_attribute).and_then(key_string).map(Some).ok_or_else(|| {
            StoreError::InvalidRequest(format!(
                "continuation token lacks key attribute '{}'",
                self.key_attribute
            ))
        })
    }

    fn read_page(&self, request: &SegmentRequest) -> StoreResult<Page> {
        let scan = &request.scan;
        if scan.collection != self.name {
            return Err(StoreError::NotFound(format!("collection '{}'", scan.collection)));
        }
        if request.total_segments == 0 || request.segment >= request.total_segments {
            return Err(StoreError::InvalidRequest(format!(
                "segment {} out of range for {} total segments",
                request.segment, request.total_segments
            )));
        }
        let limit = match scan.limit {
            Some(0) => return Err(StoreError::InvalidRequest("limit must be positive".into())),
            Some(limit) => limit as usize,
            None => usize::MAX,
        };

        let filter = Filter::parse(
            scan.filter_expression.as_deref(),
            &scan.attribute_names,
            &scan.attribute_values,
        )?;
        let projection =
            Projection::parse(scan.projection_expression.as_deref(), &scan.attribute_names)?;
        let start = self.start_key(request.exclusive_start.as_ref())?;

        let items = self.items.read();
        let lower = match start.as_deref() {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        let mut in_segment = items
            .range::<str, _>((lower, Bound::Unbounded))
            .filter(|(key, _)| Self::segment_of(key, request.total_segments) == request.segment)
            .peekable();

        let mut returned = Vec::new();
        let mut scanned = 0;
        let mut last = None;
        while scanned < limit {
            let Some((_, item)) = in_segment.next() else {
                break;
            };
            scanned += 1;
            last = Some(item);
            if filter.matches(item) {
                returned.push(projection.apply(item));
            }
        }

        let continuation = match (last, in_segment.peek()) {
            (Some(item), Some(_)) => Some(self.token_for(item)),
            _ => None,
        };

        Ok(Page::new(returned).with_scanned_count(scanned).with_continuation(continuation))
    }

    fn token_for(&self, item: &Item) -> ContinuationToken {
        let mut key = Item::new();
        if let Some(value) = item.get(&self.key_attribute) {
            key.insert(self.key_attribute.clone(), value.clone());
        }
        ContinuationToken::new(key)
    }
}

#[async_trait]
impl SegmentReader for MemoryTable {
    async fn read_segment(&self, request: &SegmentRequest) -> StoreResult<Page> {
        let page = self.read_page(request)?;
        debug!(
            collection = %self.name,
            segment = request.segment,
            items = page.count,
            scanned = page.scanned_count,
            has_more = page.has_more(),
            "Memory table page read"
        );
        Ok(page)
    }
}

fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
