//! Filter and projection expressions understood by [`MemoryTable`](super::MemoryTable)
//!
//! Filters are one or more comparisons joined by `AND`:
//!
//! ```text
//! #status = :open AND region <> 'eu-west-1'
//! ```
//!
//! The left side is an attribute name or a `#placeholder` resolved through
//! the request's attribute names. The right side is a `:placeholder`
//! resolved through the request's attribute values, a quoted string, or a
//! JSON literal (a bare word falls back to a string). Projections are
//! comma-separated attribute names or placeholders.

use std::collections::BTreeMap;

use segscan_domain::{Item, StoreError, StoreResult};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, PartialEq)]
struct Condition {
    attribute: String,
    comparison: Comparison,
    value: Value,
}

/// Parsed conjunction of attribute comparisons
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Parse `expression`; `None` matches every item
    pub fn parse(
        expression: Option<&str>,
        names: &BTreeMap<String, String>,
        values: &BTreeMap<String, Value>,
    ) -> StoreResult<Self> {
        let Some(expression) = expression.map(str::trim).filter(|e| !e.is_empty()) else {
            return Ok(Self::default());
        };

        let conditions = expression
            .split(" AND ")
            .map(|clause| parse_condition(clause.trim(), names, values))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Self { conditions })
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.conditions.iter().all(|condition| {
            let equal = item.get(&condition.attribute) == Some(&condition.value);
            match condition.comparison {
                Comparison::Equal => equal,
                Comparison::NotEqual => !equal,
            }
        })
    }
}

fn parse_condition(
    clause: &str,
    names: &BTreeMap<String, String>,
    values: &BTreeMap<String, Value>,
) -> StoreResult<Condition> {
    let (lhs, comparison, rhs) = if let Some((lhs, rhs)) = clause.split_once("<>") {
        (lhs, Comparison::NotEqual, rhs)
    } else if let Some((lhs, rhs)) = clause.split_once('=') {
        (lhs, Comparison::Equal, rhs)
    } else {
        return Err(invalid(format!("unsupported filter clause '{clause}'")));
    };

    Ok(Condition {
        attribute: resolve_name(lhs.trim(), names)?,
        comparison,
        value: resolve_value(rhs.trim(), values)?,
    })
}

/// Parsed projection; `None` keeps every attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    attributes: Option<Vec<String>>,
}

impl Projection {
    pub fn parse(expression: Option<&str>, names: &BTreeMap<String, String>) -> StoreResult<Self> {
        let Some(expression) = expression.map(str::trim).filter(|e| !e.is_empty()) else {
            return Ok(Self::default());
        };

        let attributes = expression
            .split(',')
            .map(|name| resolve_name(name.trim(), names))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Self { attributes: Some(attributes) })
    }

    pub fn apply(&self, item: &Item) -> Item {
        match &self.attributes {
            None => item.clone(),
            Some(attributes) => attributes
                .iter()
                .filter_map(|name| item.get(name).map(|value| (name.clone(), value.clone())))
                .collect(),
        }
    }
}

fn resolve_name(token: &str, names: &BTreeMap<String, String>) -> StoreResult<String> {
    if token.is_empty() {
        return Err(invalid("empty attribute name"));
    }
    if token.starts_with('#') {
        return names
            .get(token)
            .cloned()
            .ok_or_else(|| invalid(format!("undefined attribute name placeholder '{token}'")));
    }
    Ok(token.to_string())
}

fn resolve_value(token: &str, values: &BTreeMap<String, Value>) -> StoreResult<Value> {
    if token.is_empty() {
        return Err(invalid("missing comparison value"));
    }
    if token.starts_with(':') {
        return values
            .get(token)
            .cloned()
            .ok_or_else(|| invalid(format!("undefined attribute value placeholder '{token}'")));
    }
    for quote in ['\'', '"'] {
        if let Some(inner) = token.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            return Ok(Value::String(inner.to_string()));
        }
    }
    Ok(serde_json::from_str(token).unwrap_or_else(|_| Value::String(token.to_string())))
}

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidRequest(message.into())
}
