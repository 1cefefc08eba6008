//! Cache values and the storage codec
//!
//! Every backend stores the same closed value type through one codec:
//! integers travel as their decimal text form, everything else as JSON.
//! Remote stores cannot distinguish "stored an integer" from "stored a
//! serialized integer" on their own, and the increment/decrement commands
//! only operate on plain decimal payloads, so the codec owns that
//! disambiguation; a freshly written `Int` is immediately countable.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Payloads matching this pattern decode as integers; everything else goes
/// through the structured path. Evaluated on raw bytes so binary garbage
/// never reaches the UTF-8 decoder.
static INT_PATTERN: LazyLock<regex::bytes::Regex> =
    LazyLock::new(|| regex::bytes::Regex::new(r"^-?\d+$").expect("integer pattern is valid"));

/// A cacheable value
///
/// Closed set of primitives and nested containers, round-trippable through
/// [`Value::encode`] / [`Value::decode`]. Serialized form is untagged, so
/// the structured encoding is plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent/null marker stored as an explicit value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer; the only variant usable with increment/decrement
    Int(i64),
    /// Floating point number
    Float(f64),
    /// UTF-8 text
    String(String),
    /// Ordered list of values
    Array(Vec<Value>),
    /// String-keyed mapping (ordered for stable encoding)
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Encode for storage: `Int` as decimal text, everything else as JSON.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Value::Int(n) => Ok(n.to_string().into_bytes()),
            other => serde_json::to_vec(other).map_err(|e| {
                Error::invalid_value(format!("value cannot be serialized: {e}"))
            }),
        }
    }

    /// Decode a stored payload.
    ///
    /// Bytes matching `^-?\d+$` decode as `Int`; a digit run too long for
    /// `i64` falls through to the structured path instead of erroring.
    /// Payloads that fit neither form fail with a corrupt-entry error,
    /// which read paths report as a miss.
    pub fn decode(bytes: &[u8]) -> Result<Value> {
        if INT_PATTERN.is_match(bytes) {
            if let Ok(text) = std::str::from_utf8(bytes) {
                if let Ok(n) = text.parse::<i64>() {
                    return Ok(Value::Int(n));
                }
            }
        }
        serde_json::from_slice(bytes).map_err(|e| {
            Error::corrupt_with_source("payload is neither an integer nor structured data", e)
        })
    }

    /// The integer content, if this is an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The string content, if this is a `String`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for the empty-string value, which the filesystem backend
    /// rejects as ambiguous with "absent".
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Value::String(s) if s.is_empty())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}
