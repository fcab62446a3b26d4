//! # Typed Attribute System
//!
//! Scalar value types for node and edge attributes: detection,
//! conversion and comparison.
//!
//! Every attribute carries both a value and an explicit [`ValueType`]
//! tag. The tag is stored, never re-inferred, so a numeric string that
//! was deliberately stored as a string survives any round trip through
//! a host serializer.
//!
//! ## Determinism Guarantees
//!
//! - Detection and conversion are pure functions of the input.
//! - Normalisation (detect + convert) is idempotent.
//! - [`Attributes`] uses `BTreeMap` for stable iteration order.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// VALUE TYPE TAGS
// =============================================================================

/// Closed set of scalar attribute types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Int,
    Float,
    Bool,
    Date,
    Str,
}

impl ValueType {
    /// Lowercase tag name, as embedded in serialized output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Str => "str",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// COMPARISON OPERATORS
// =============================================================================

/// Comparison operators accepted by filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    /// The textual operator symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Parse an operator symbol. Returns `None` for unknown symbols.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors surfaced by the engine.
///
/// Every operation either fully succeeds or fails without mutating
/// prior state; none of these are fatal in the process-crashing sense.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node with the same identifier already exists in the graph.
    #[error("node '{0}' already exists")]
    DuplicateNode(String),

    /// An edge with the same identifier already exists in the graph.
    #[error("edge '{0}' already exists")]
    DuplicateEdge(String),

    /// The requested node is not present in the graph.
    #[error("node '{0}' not found")]
    NodeNotFound(String),

    /// The requested edge is not present in the graph.
    #[error("edge '{0}' not found")]
    EdgeNotFound(String),

    /// An edge endpoint does not resolve to a node in the same graph.
    #[error("edge '{edge}': endpoint node '{node}' not in graph")]
    EndpointMissing { edge: String, node: String },

    /// A value could not be coerced to the requested type.
    #[error("cannot convert '{value}' to {target}")]
    Conversion { value: String, target: ValueType },

    /// Two values are mutually incomparable under an ordering operator.
    #[error("cannot compare {left} and {right} with '{op}'")]
    Comparison {
        left: &'static str,
        right: &'static str,
        op: ComparisonOp,
    },

    /// A filter query has invalid syntax.
    #[error("invalid filter query: {0}")]
    FilterParse(String),

    /// A filter literal is incompatible with a node's attribute type.
    #[error("incompatible type for attribute '{0}'")]
    FilterType(String),

    /// A search query is empty or malformed.
    #[error("invalid search query: {0}")]
    SearchParse(String),

    /// A CLI command string could not be parsed.
    #[error("{0}")]
    CommandParse(String),

    /// A named plugin is not registered.
    #[error("{kind} plugin '{name}' not found")]
    PluginNotFound { kind: &'static str, name: String },

    /// A plugin failed while parsing or rendering.
    #[error("plugin error: {0}")]
    Plugin(String),

    /// The host supplied an unusable configuration file.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O failure in a host-side operation; the engine itself does
    /// no I/O.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    /// The requested workspace does not exist.
    #[error("workspace '{0}' not found")]
    WorkspaceNotFound(String),

    /// No workspace is active on the platform.
    #[error("no active workspace; load a graph first")]
    NoActiveWorkspace,
}

// =============================================================================
// ATTRIBUTE VALUES
// =============================================================================

/// A typed scalar attribute value.
///
/// The serde representation is self-tagging (`{"type": ..., "value": ...}`),
/// so host serializers preserve the [`ValueType`] tag explicitly instead
/// of re-inferring it on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Str(String),
    Null,
}

impl AttrValue {
    /// Detect the [`ValueType`] of this value.
    ///
    /// Typed values map to their own tag. `Null` maps to [`ValueType::Str`]
    /// by convention, keeping "attribute deleted" and "attribute null"
    /// unambiguous. Strings are probed in order: integer, float, ISO date,
    /// else string literal.
    #[must_use]
    pub fn detect_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Bool(_) => ValueType::Bool,
            Self::Date(_) => ValueType::Date,
            Self::Null => ValueType::Str,
            Self::Str(s) => detect_str_type(s),
        }
    }

    /// Convert this value to `target`.
    ///
    /// Converting a value to its own detected type is a no-op.
    pub fn convert_to(&self, target: ValueType) -> Result<Self, GraphError> {
        let unconvertible = || GraphError::Conversion {
            value: self.to_string(),
            target,
        };

        match target {
            ValueType::Int => match self {
                Self::Int(i) => Ok(Self::Int(*i)),
                Self::Float(f) => Ok(Self::Int(*f as i64)),
                Self::Bool(b) => Ok(Self::Int(i64::from(*b))),
                Self::Str(s) => s.trim().parse::<i64>().map(Self::Int).map_err(|_| unconvertible()),
                Self::Date(_) | Self::Null => Err(unconvertible()),
            },
            ValueType::Float => match self {
                Self::Float(f) => Ok(Self::Float(*f)),
                Self::Int(i) => Ok(Self::Float(*i as f64)),
                Self::Bool(b) => Ok(Self::Float(if *b { 1.0 } else { 0.0 })),
                Self::Str(s) => s.trim().parse::<f64>().map(Self::Float).map_err(|_| unconvertible()),
                Self::Date(_) | Self::Null => Err(unconvertible()),
            },
            ValueType::Bool => match self {
                Self::Bool(b) => Ok(Self::Bool(*b)),
                Self::Int(i) => Ok(Self::Bool(*i != 0)),
                Self::Float(f) => Ok(Self::Bool(*f != 0.0)),
                Self::Str(s) => {
                    let lowered = s.trim().to_ascii_lowercase();
                    Ok(Self::Bool(matches!(lowered.as_str(), "true" | "1" | "yes")))
                }
                Self::Date(_) | Self::Null => Err(unconvertible()),
            },
            ValueType::Date => match self {
                Self::Date(d) => Ok(Self::Date(*d)),
                Self::Str(s) => parse_iso_date(s.trim()).map(Self::Date).ok_or_else(unconvertible),
                _ => Err(unconvertible()),
            },
            ValueType::Str => match self {
                // Null keeps its STRING tag but stays null.
                Self::Null => Ok(Self::Null),
                Self::Str(s) => Ok(Self::Str(s.clone())),
                other => Ok(Self::Str(other.to_string())),
            },
        }
    }

    /// Normalise: detect the type, convert the value to it, and return
    /// both. Idempotent — normalising a normalised value changes nothing.
    #[must_use]
    pub fn normalized(self) -> (Self, ValueType) {
        if matches!(self, Self::Null) {
            return (Self::Null, ValueType::Str);
        }
        let tag = self.detect_type();
        match self.convert_to(tag) {
            Ok(value) => (value, tag),
            // Detection guarantees convertibility; keep the literal if not.
            Err(_) => {
                let literal = self.to_string();
                (Self::Str(literal), ValueType::Str)
            }
        }
    }

    /// Compare two values under `op`.
    ///
    /// Equality never fails: values of incompatible types are simply
    /// unequal. Ordering requires both operands to be numeric, or of the
    /// same type; anything else (including null operands) fails with
    /// [`GraphError::Comparison`].
    pub fn compare(&self, other: &Self, op: ComparisonOp) -> Result<bool, GraphError> {
        match op {
            ComparisonOp::Eq => Ok(self.loose_eq(other)),
            ComparisonOp::Ne => Ok(!self.loose_eq(other)),
            ComparisonOp::Lt | ComparisonOp::Le | ComparisonOp::Gt | ComparisonOp::Ge => {
                let ordering = self.partial_order(other).ok_or(GraphError::Comparison {
                    left: self.kind_name(),
                    right: other.kind_name(),
                    op,
                })?;
                Ok(match op {
                    ComparisonOp::Lt => ordering == Ordering::Less,
                    ComparisonOp::Le => ordering != Ordering::Greater,
                    ComparisonOp::Gt => ordering == Ordering::Greater,
                    ComparisonOp::Ge => ordering != Ordering::Less,
                    ComparisonOp::Eq | ComparisonOp::Ne => false,
                })
            }
        }
    }

    /// Whether this value is null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short lowercase name of the value's kind, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Date(_) => "date",
            Self::Str(_) => "str",
            Self::Null => "null",
        }
    }

    fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Null, Self::Null) => true,
            _ => false,
        }
    }

    fn partial_order(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    /// Canonical string rendering. Dates render in ISO form; this is the
    /// form inspected by value searches.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Str(s) => f.write_str(s),
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<NaiveDate> for AttrValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// String detection order: integer, float, ISO date, else string literal.
fn detect_str_type(s: &str) -> ValueType {
    let trimmed = s.trim();
    if trimmed.parse::<i64>().is_ok() {
        ValueType::Int
    } else if trimmed.parse::<f64>().is_ok() {
        ValueType::Float
    } else if parse_iso_date(trimmed).is_some() {
        ValueType::Date
    } else {
        ValueType::Str
    }
}

/// Parse an ISO date or datetime; datetimes are truncated to their date.
fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

// =============================================================================
// ATTRIBUTE MAPS
// =============================================================================

/// Typed attribute storage shared by nodes and edges.
///
/// Invariant: the value map and the type map always hold exactly the
/// same keys. Null values are stored with the [`ValueType::Str`] tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    values: BTreeMap<String, AttrValue>,
    types: BTreeMap<String, ValueType>,
}

impl Attributes {
    /// Create an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute with automatic type detection.
    ///
    /// The value is normalised to its detected type, so `Str("42")`
    /// is stored as `Int(42)` with an `int` tag.
    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        let key = key.into();
        let (value, tag) = value.normalized();
        self.values.insert(key.clone(), value);
        self.types.insert(key, tag);
    }

    /// Set an attribute with an explicit type tag, converting the value.
    ///
    /// This is the entry point for deserializers that carry stored tags
    /// and must not re-infer them. Null values always take the `str` tag.
    pub fn set_typed(
        &mut self,
        key: impl Into<String>,
        value: AttrValue,
        tag: ValueType,
    ) -> Result<(), GraphError> {
        let key = key.into();
        if value.is_null() {
            self.values.insert(key.clone(), AttrValue::Null);
            self.types.insert(key, ValueType::Str);
            return Ok(());
        }
        let converted = value.convert_to(tag)?;
        self.values.insert(key.clone(), converted);
        self.types.insert(key, tag);
        Ok(())
    }

    /// Get an attribute value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.values.get(key)
    }

    /// Get an attribute's type tag.
    #[must_use]
    pub fn type_of(&self, key: &str) -> Option<ValueType> {
        self.types.get(key).copied()
    }

    /// Remove an attribute (value and tag). Returns the removed value.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.types.remove(key);
        self.values.remove(key)
    }

    /// Whether the attribute exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.values.iter()
    }

    /// Iterate attribute names in key order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn detection_order_for_strings() {
        assert_eq!(AttrValue::from("42").detect_type(), ValueType::Int);
        assert_eq!(AttrValue::from("-5").detect_type(), ValueType::Int);
        assert_eq!(AttrValue::from("3.5").detect_type(), ValueType::Float);
        assert_eq!(AttrValue::from("2024-01-15").detect_type(), ValueType::Date);
        assert_eq!(
            AttrValue::from("2024-01-15T10:30:00").detect_type(),
            ValueType::Date
        );
        assert_eq!(AttrValue::from("Alice").detect_type(), ValueType::Str);
    }

    #[test]
    fn typed_values_detect_their_own_tag() {
        assert_eq!(AttrValue::Int(1).detect_type(), ValueType::Int);
        assert_eq!(AttrValue::Float(1.5).detect_type(), ValueType::Float);
        assert_eq!(AttrValue::Bool(true).detect_type(), ValueType::Bool);
        assert_eq!(AttrValue::Date(date(2020, 1, 1)).detect_type(), ValueType::Date);
    }

    #[test]
    fn null_detects_as_str() {
        assert_eq!(AttrValue::Null.detect_type(), ValueType::Str);
    }

    #[test]
    fn normalisation_is_idempotent() {
        let (once, tag_once) = AttrValue::from("42").normalized();
        let (twice, tag_twice) = once.clone().normalized();
        assert_eq!(once, twice);
        assert_eq!(tag_once, tag_twice);
        assert_eq!(once, AttrValue::Int(42));
    }

    #[test]
    fn conversion_to_own_type_is_noop() {
        let v = AttrValue::Int(7);
        assert_eq!(v.convert_to(ValueType::Int).expect("convert"), v);
        let d = AttrValue::Date(date(2024, 5, 1));
        assert_eq!(d.convert_to(ValueType::Date).expect("convert"), d);
    }

    #[test]
    fn string_to_int_conversion() {
        assert_eq!(
            AttrValue::from("30").convert_to(ValueType::Int).expect("convert"),
            AttrValue::Int(30)
        );
        assert!(AttrValue::from("thirty").convert_to(ValueType::Int).is_err());
        assert!(AttrValue::from("3.5").convert_to(ValueType::Int).is_err());
    }

    #[test]
    fn string_to_date_conversion() {
        assert_eq!(
            AttrValue::from("2024-01-15").convert_to(ValueType::Date).expect("convert"),
            AttrValue::Date(date(2024, 1, 15))
        );
        assert!(AttrValue::from("not a date").convert_to(ValueType::Date).is_err());
    }

    #[test]
    fn bool_conversion_accepts_common_spellings() {
        for s in ["true", "True", "1", "yes"] {
            assert_eq!(
                AttrValue::from(s).convert_to(ValueType::Bool).expect("convert"),
                AttrValue::Bool(true)
            );
        }
        assert_eq!(
            AttrValue::from("no").convert_to(ValueType::Bool).expect("convert"),
            AttrValue::Bool(false)
        );
    }

    #[test]
    fn null_conversion_to_numeric_fails() {
        assert!(AttrValue::Null.convert_to(ValueType::Int).is_err());
        assert!(AttrValue::Null.convert_to(ValueType::Date).is_err());
        // Str keeps null as null.
        assert_eq!(
            AttrValue::Null.convert_to(ValueType::Str).expect("convert"),
            AttrValue::Null
        );
    }

    #[test]
    fn equality_across_types_is_false_not_error() {
        let a = AttrValue::Int(1);
        let b = AttrValue::from("1");
        assert!(!a.compare(&b, ComparisonOp::Eq).expect("compare"));
        assert!(a.compare(&b, ComparisonOp::Ne).expect("compare"));
        assert!(!AttrValue::Null.compare(&a, ComparisonOp::Eq).expect("compare"));
    }

    #[test]
    fn numeric_cross_type_ordering() {
        let a = AttrValue::Int(3);
        let b = AttrValue::Float(3.5);
        assert!(a.compare(&b, ComparisonOp::Lt).expect("compare"));
        assert!(b.compare(&a, ComparisonOp::Ge).expect("compare"));
    }

    #[test]
    fn incomparable_ordering_fails() {
        let d = AttrValue::Date(date(2024, 1, 1));
        let i = AttrValue::Int(5);
        assert!(d.compare(&i, ComparisonOp::Gt).is_err());
        assert!(AttrValue::Null.compare(&i, ComparisonOp::Lt).is_err());
    }

    #[test]
    fn date_ordering() {
        let early = AttrValue::Date(date(2020, 1, 1));
        let late = AttrValue::Date(date(2024, 1, 1));
        assert!(early.compare(&late, ComparisonOp::Lt).expect("compare"));
        assert!(late.compare(&late, ComparisonOp::Le).expect("compare"));
    }

    #[test]
    fn attributes_maps_stay_parallel() {
        let mut attrs = Attributes::new();
        attrs.set("Age", AttrValue::from("30"));
        attrs.set("Name", AttrValue::from("Alice"));
        assert_eq!(attrs.get("Age"), Some(&AttrValue::Int(30)));
        assert_eq!(attrs.type_of("Age"), Some(ValueType::Int));
        assert_eq!(attrs.type_of("Name"), Some(ValueType::Str));

        attrs.remove("Age");
        assert!(attrs.get("Age").is_none());
        assert!(attrs.type_of("Age").is_none());
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn null_attribute_stored_with_str_tag() {
        let mut attrs = Attributes::new();
        attrs.set("Comment", AttrValue::Null);
        assert_eq!(attrs.get("Comment"), Some(&AttrValue::Null));
        assert_eq!(attrs.type_of("Comment"), Some(ValueType::Str));
    }

    #[test]
    fn set_typed_preserves_explicit_tag() {
        let mut attrs = Attributes::new();
        // A numeric string deliberately stored as a string must stay one.
        attrs
            .set_typed("Zip", AttrValue::from("01234"), ValueType::Str)
            .expect("set_typed");
        assert_eq!(attrs.get("Zip"), Some(&AttrValue::Str("01234".into())));
        assert_eq!(attrs.type_of("Zip"), Some(ValueType::Str));
    }
}
