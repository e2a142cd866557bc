//! Pages returned by segment reads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stored record, as an attribute map
pub type Item = Map<String, Value>;

/// Opaque marker where a segment's previous page stopped
///
/// Holds the key attributes of the last examined item. Readers hand it out
/// and accept it back; nothing else inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(Item);

impl ContinuationToken {
    pub fn new(key: Item) -> Self {
        Self(key)
    }

    pub fn key(&self) -> &Item {
        &self.0
    }

    pub fn into_key(self) -> Item {
        self.0
    }
}

impl From<Item> for ContinuationToken {
    fn from(key: Item) -> Self {
        Self(key)
    }
}

/// Outcome of one successful page read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Returned items, in store order
    pub items: Vec<Item>,
    /// Number of returned items
    pub count: usize,
    /// Items examined by the store, before filtering
    pub scanned_count: usize,
    /// Present when the segment has more data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<ContinuationToken>,
}

impl Page {
    /// A page whose scanned count equals its item count
    pub fn new(items: Vec<Item>) -> Self {
        let count = items.len();
        Self { items, count, scanned_count: count, continuation: None }
    }

    pub fn with_scanned_count(mut self, scanned_count: usize) -> Self {
        self.scanned_count = scanned_count;
        self
    }

    pub fn with_continuation(mut self, continuation: Option<ContinuationToken>) -> Self {
        self.continuation = continuation;
        self
    }

    pub fn has_more(&self) -> bool {
        self.continuation.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
