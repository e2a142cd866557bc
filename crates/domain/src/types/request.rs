//! Scan requests

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::page::ContinuationToken;

/// Immutable description of a scan, without any segment-specific fields
///
/// The orchestrator turns one template into many [`SegmentRequest`]s through
/// [`ScanRequest::for_segment`]; callers never set segment fields themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Target collection (table) identifier
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,
    /// Placeholder names (`#name`) used by the expressions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attribute_names: BTreeMap<String, String>,
    /// Placeholder values (`:value`) used by the expressions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attribute_values: BTreeMap<String, Value>,
    /// Maximum number of items examined per page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub consistent_read: bool,
}

impl ScanRequest {
    pub fn new(collection: impl Into<String>) -> Self {
        Self { collection: collection.into(), ..Self::default() }
    }

    pub fn with_filter(mut self, expression: impl Into<String>) -> Self {
        self.filter_expression = Some(expression.into());
        self
    }

    pub fn with_projection(mut self, expression: impl Into<String>) -> Self {
        self.projection_expression = Some(expression.into());
        self
    }

    pub fn with_attribute_name(
        mut self,
        placeholder: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.attribute_names.insert(placeholder.into(), name.into());
        self
    }

    pub fn with_attribute_value(mut self, placeholder: impl Into<String>, value: Value) -> Self {
        self.attribute_values.insert(placeholder.into(), value);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }

    /// Merge the template with the fields of one segment task
    pub fn for_segment(
        &self,
        segment: u32,
        total_segments: u32,
        exclusive_start: Option<ContinuationToken>,
    ) -> SegmentRequest {
        SegmentRequest { scan: self.clone(), segment, total_segments, exclusive_start }
    }
}

/// A fully assembled read for one page of one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRequest {
    #[serde(flatten)]
    pub scan: ScanRequest,
    pub segment: u32,
    pub total_segments: u32,
    /// Absent on the first page of a segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_start: Option<ContinuationToken>,
}

impl SegmentRequest {
    pub fn is_first_page(&self) -> bool {
        self.exclusive_start.is_none()
    }
}
