//! Identity claims
//!
//! Claims arrive from third-party identity providers as arbitrary JSON. They are
//! normalized once, at construction, into the closed [`ClaimValue`] variant so the
//! resolution logic never inspects raw JSON.

use crate::error::{AuthzError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Shape of a single claim value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimValue {
    /// Plain string (e.g. `email`)
    String(String),
    /// Boolean (e.g. `email_verified`)
    Bool(bool),
    /// List made only of strings (e.g. `groups`)
    StringList(Vec<String>),
    /// List of mixed values, each already rendered to text
    MixedList(Vec<String>),
    /// Anything else (numbers, objects, null); never resolves to a role
    Unsupported,
}

impl ClaimValue {
    /// Textual representations used as attribute values for directory lookups
    ///
    /// A string or boolean yields one representation, a list yields one per
    /// element, an unsupported shape yields none.
    pub fn representations(&self) -> Vec<String> {
        match self {
            Self::String(s) => vec![s.clone()],
            Self::Bool(b) => vec![b.to_string()],
            Self::StringList(items) | Self::MixedList(items) => items.clone(),
            Self::Unsupported => Vec::new(),
        }
    }

    /// Whether this value is skipped by resolution
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported)
    }
}

impl From<&Value> for ClaimValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::String(s.clone()),
            Value::Bool(b) => Self::Bool(*b),
            Value::Array(items) => {
                if items.iter().all(Value::is_string) {
                    Self::StringList(
                        items
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect(),
                    )
                } else {
                    Self::MixedList(items.iter().map(render_element).collect())
                }
            }
            Value::Number(_) | Value::Object(_) | Value::Null => Self::Unsupported,
        }
    }
}

impl From<Value> for ClaimValue {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

impl From<&str> for ClaimValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ClaimValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<String>> for ClaimValue {
    fn from(items: Vec<String>) -> Self {
        Self::StringList(items)
    }
}

impl From<Vec<&str>> for ClaimValue {
    fn from(items: Vec<&str>) -> Self {
        Self::StringList(items.into_iter().map(str::to_string).collect())
    }
}

/// Default text form of a list element
fn render_element(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Verified claims of one identity
///
/// Immutable once built; the engine only ever borrows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ClaimSet {
    claims: BTreeMap<String, ClaimValue>,
}

impl ClaimSet {
    /// Create an empty claim set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a claim
    pub fn with_claim(mut self, key: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        self.claims.insert(key.into(), value.into());
        self
    }

    /// Build a claim set from a decoded JSON document, which must be an object
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from(map.clone())),
            other => Err(AuthzError::InvalidInput(format!(
                "claims must be a JSON object, got {}",
                json_kind(other)
            ))),
        }
    }

    /// Parse a claim set from JSON text
    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_json(&value)
    }

    /// Look up a claim
    pub fn get(&self, key: &str) -> Option<&ClaimValue> {
        self.claims.get(key)
    }

    /// Iterate claims in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClaimValue)> {
        self.claims.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of claims
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether no claims are present
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Every `(claim key, representation)` pair, in key order
    ///
    /// Unsupported values contribute nothing and are reported at debug level.
    pub fn attribute_pairs(&self) -> Vec<(&str, String)> {
        let mut pairs = Vec::new();
        for (key, value) in self.iter() {
            if value.is_unsupported() {
                tracing::debug!(claim = key, "unsupported claim type, skipping");
                continue;
            }
            for repr in value.representations() {
                pairs.push((key, repr));
            }
        }
        pairs
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            claims: map.iter().map(|(k, v)| (k.clone(), ClaimValue::from(v))).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<ClaimValue>> FromIterator<(K, V)> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            claims: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
