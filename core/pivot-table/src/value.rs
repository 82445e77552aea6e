//! FILENAME: core/pivot-table/src/value.rs
//! Field values - what a record holds and how the transform reads it.
//!
//! Three views of the same input value:
//! - `FieldValue`: the value as supplied by the caller (and echoed in output)
//! - `KeyValue`: a hashable identity used for group and column-path lookups
//! - display text: the string form used for case-insensitive ordering

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ============================================================================
// FIELD VALUE
// ============================================================================

/// A single field of an input record.
/// Deserializes untagged, so a JSON object maps straight onto a record.
/// Arrays and objects land in `Other` and pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Other(serde_json::Value),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Empty
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric coercion with script-style `Number(x)` semantics.
    /// Anything that does not read as a number becomes NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            FieldValue::Empty => 0.0,
            FieldValue::Number(n) => *n,
            FieldValue::Boolean(true) => 1.0,
            FieldValue::Boolean(false) => 0.0,
            FieldValue::Text(s) => parse_number_text(s),
            FieldValue::Other(_) => f64::NAN,
        }
    }

    /// The string form used when comparing display values.
    pub fn display_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Number(n) => write!(f, "{}", format_number(*n)),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Coerces an optional field (absent fields read as NaN).
pub fn coerce_number(value: Option<&FieldValue>) -> f64 {
    value.map_or(f64::NAN, FieldValue::to_number)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == 0.0 {
        // -0 prints as 0
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

fn parse_number_text(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    // Radix literals take no sign.
    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&s[2..], radix)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }

    // Rust's float grammar also accepts "inf"/"nan"; restrict to digits first.
    let decimal_only = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !decimal_only {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Case-insensitive ascending comparison of two display strings.
/// Only ASCII letters fold; there is no locale-aware collation.
pub fn compare_display(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_uppercase())
        .cmp(b.bytes().map(|c| c.to_ascii_uppercase()))
}

// ============================================================================
// KEY VALUE
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as map keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // 0.0 and -0.0 compare equal, so they must hash alike
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

/// A normalized, hashable identity value.
/// An absent field reads as `Empty`, the same identity as an explicit null,
/// since both are echoed into the output as null.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
    /// Compact JSON text of an array or object.
    Other(String),
}

impl KeyValue {
    pub fn of(value: Option<&FieldValue>) -> Self {
        value.map_or(KeyValue::Empty, KeyValue::from)
    }

    /// Same result as `*self == KeyValue::of(value)`, without cloning text.
    pub fn matches(&self, value: Option<&FieldValue>) -> bool {
        match (self, value) {
            (KeyValue::Empty, None | Some(FieldValue::Empty)) => true,
            (KeyValue::Number(a), Some(FieldValue::Number(b))) => *a == OrderedFloat(*b),
            (KeyValue::Text(a), Some(FieldValue::Text(b))) => a == b,
            (KeyValue::Boolean(a), Some(FieldValue::Boolean(b))) => a == b,
            (KeyValue::Other(a), Some(FieldValue::Other(b))) => *a == b.to_string(),
            _ => false,
        }
    }
}

impl From<&FieldValue> for KeyValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Empty => KeyValue::Empty,
            FieldValue::Number(n) => KeyValue::Number(OrderedFloat(*n)),
            FieldValue::Text(s) => KeyValue::Text(s.clone()),
            FieldValue::Boolean(b) => KeyValue::Boolean(*b),
            FieldValue::Other(v) => KeyValue::Other(v.to_string()),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Empty => Ok(()),
            KeyValue::Number(n) => f.write_str(&format_number(n.0)),
            KeyValue::Text(s) => f.write_str(s),
            KeyValue::Boolean(b) => write!(f, "{}", b),
            KeyValue::Other(s) => f.write_str(s),
        }
    }
}

/// Ordered tuple of identity values, one per dimension level.
/// Row groups and column paths rarely nest deeper than four levels.
pub type IdentityKey = SmallVec<[KeyValue; 4]>;

// ============================================================================
// RECORD ACCESS
// ============================================================================

/// Read access to one input record by field name.
pub trait RecordSource {
    fn field(&self, name: &str) -> Option<&FieldValue>;
}

/// The default record representation.
pub type Record = BTreeMap<String, FieldValue>;

impl RecordSource for BTreeMap<String, FieldValue> {
    fn field(&self, name: &str) -> Option<&FieldValue> {
        self.get(name)
    }
}

impl<S: BuildHasher> RecordSource for HashMap<String, FieldValue, S> {
    fn field(&self, name: &str) -> Option<&FieldValue> {
        self.get(name)
    }
}

impl<R: RecordSource + ?Sized> RecordSource for &R {
    fn field(&self, name: &str) -> Option<&FieldValue> {
        (**self).field(name)
    }
}

/// Parses a JSON array of objects into records.
pub fn records_from_json(json: &str) -> crate::error::Result<Vec<Record>> {
    Ok(serde_json::from_str(json)?)
}
