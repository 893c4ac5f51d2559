//! Reconstructed document values.
//!
//! Only the record currently being read is ever held as a value; whole
//! sections are never materialized.

use std::collections::BTreeMap;

/// A JSON-like value rebuilt from the token feed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DocumentValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
    Array(Vec<DocumentValue>),
    Object(BTreeMap<String, DocumentValue>),
}

impl DocumentValue {
    /// Empty object.
    pub fn object() -> Self {
        DocumentValue::Object(BTreeMap::new())
    }

    /// Empty array, pre-sized from the tokenizer's hint.
    pub fn array(size_hint: Option<usize>) -> Self {
        DocumentValue::Array(Vec::with_capacity(size_hint.unwrap_or(0).min(64)))
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            DocumentValue::Null => "null",
            DocumentValue::Bool(_) => "boolean",
            DocumentValue::Integer(_) | DocumentValue::Unsigned(_) => "integer",
            DocumentValue::Float(_) => "number",
            DocumentValue::String(_) => "string",
            DocumentValue::Array(_) => "array",
            DocumentValue::Object(_) => "object",
        }
    }

    /// Any numeric variant as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DocumentValue::Integer(v) => Some(*v as f64),
            DocumentValue::Unsigned(v) => Some(*v as f64),
            DocumentValue::Float(v) => Some(*v),
            DocumentValue::Null
            | DocumentValue::Bool(_)
            | DocumentValue::String(_)
            | DocumentValue::Array(_)
            | DocumentValue::Object(_) => None,
        }
    }

    /// Integral numeric variants as `i128`, wide enough for both `i64` and `u64`.
    ///
    /// Floats with no fractional part are accepted, since some recorders
    /// write every number in floating point.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            DocumentValue::Integer(v) => Some(*v as i128),
            DocumentValue::Unsigned(v) => Some(*v as i128),
            DocumentValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i128),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DocumentValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocumentValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DocumentValue]> {
        match self {
            DocumentValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, DocumentValue>> {
        match self {
            DocumentValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key if this is an object.
    pub fn get(&self, key: &str) -> Option<&DocumentValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DocumentValue::Null)
    }
}

impl From<&str> for DocumentValue {
    fn from(s: &str) -> Self {
        DocumentValue::String(s.to_string())
    }
}

impl From<f64> for DocumentValue {
    fn from(v: f64) -> Self {
        DocumentValue::Float(v)
    }
}

impl From<i64> for DocumentValue {
    fn from(v: i64) -> Self {
        DocumentValue::Integer(v)
    }
}

impl From<bool> for DocumentValue {
    fn from(v: bool) -> Self {
        DocumentValue::Bool(v)
    }
}

impl<T: Into<DocumentValue>> From<Vec<T>> for DocumentValue {
    fn from(items: Vec<T>) -> Self {
        DocumentValue::Array(items.into_iter().map(Into::into).collect())
    }
}
