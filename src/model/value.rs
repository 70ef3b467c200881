//! Universal scalar value type for dimension elements and variable contents.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single cell of a long-format table, a dimension element, or a stored value.
///
/// `Null` is the tabular "missing" marker. It is a real, present value:
/// a sparse key mapped to `Null` exists, and a dense cell holding `Null`
/// is set. Absence is expressed by the stores themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
}

/// Semantic type of a column, dimension or variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Mixed or unknown.
    Any,
    Bool,
    Int,
    Float,
    String,
    Date,
}

// ============================================================================
// Type checking
// ============================================================================

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "STRING",
            Value::Date(_) => "DATE",
        }
    }

    /// The type of this value, `None` for `Null`.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Int(_) => Some(ValueType::Int),
            Value::Float(_) => Some(ValueType::Float),
            Value::String(_) => Some(ValueType::String),
            Value::Date(_) => Some(ValueType::Date),
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }
    pub fn is_numeric(&self) -> bool { matches!(self, Value::Int(_) | Value::Float(_)) }

    /// Attempt to extract as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Attempt to extract as f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempt to extract as &str
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value may be stored under the given declared type.
    /// `Null` fits every type; `Int` fits `Float`.
    pub fn fits(&self, ty: ValueType) -> bool {
        match (self.value_type(), ty) {
            (None, _) | (_, ValueType::Any) => true,
            (Some(ValueType::Int), ValueType::Float) => true,
            (Some(own), ty) => own == ty,
        }
    }

    /// Convert an `Int` to `Float` when `ty` is `Float`; anything else is
    /// returned unchanged.
    pub fn widen_to(self, ty: ValueType) -> Value {
        match (self, ty) {
            (Value::Int(i), ValueType::Float) => Value::Float(i as f64),
            (other, _) => other,
        }
    }
}

impl ValueType {
    /// Common type of a sequence of values, ignoring nulls.
    ///
    /// `Int` and `Float` widen to `Float`; any other mix is `Any`, as is a
    /// sequence with no non-null value.
    pub fn observe<'a>(values: impl IntoIterator<Item = &'a Value>) -> ValueType {
        let mut seen: Option<ValueType> = None;
        for ty in values.into_iter().filter_map(Value::value_type) {
            seen = Some(match seen {
                None => ty,
                Some(prev) if prev == ty => prev,
                Some(ValueType::Int) if ty == ValueType::Float => ValueType::Float,
                Some(ValueType::Float) if ty == ValueType::Int => ValueType::Float,
                Some(_) => return ValueType::Any,
            });
        }
        seen.unwrap_or(ValueType::Any)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Any => "ANY",
            ValueType::Bool => "BOOLEAN",
            ValueType::Int => "INTEGER",
            ValueType::Float => "FLOAT",
            ValueType::String => "STRING",
            ValueType::Date => "DATE",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Key semantics
// ============================================================================

// Values are used as sparse keys and dimension elements, so equality has to
// be total. Floats compare by bit pattern with both zeros folded together.
fn float_key(f: f64) -> u64 {
    if f == 0.0 { 0 } else { f.to_bits() }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_key(*a) == float_key(*b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => float_key(*f).hash(state),
            Value::String(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<NaiveDate> for Value { fn from(v: NaiveDate) -> Self { Value::Date(v) } }
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Value::Null) }
}

/// Convert from Value to concrete types.
pub trait FromValue: Sized {
    fn from_value(val: &Value) -> Result<Self>;
}

fn type_error(expected: &str, val: &Value) -> Error {
    Error::TypeError {
        expected: expected.into(),
        got: val.type_name().into(),
    }
}

impl FromValue for Value {
    fn from_value(val: &Value) -> Result<Self> { Ok(val.clone()) }
}

impl FromValue for f64 {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_float().ok_or_else(|| type_error("Float", val))
    }
}

impl FromValue for i64 {
    fn from_value(val: &Value) -> Result<Self> {
        val.as_int().ok_or_else(|| type_error("Integer", val))
    }
}

impl FromValue for bool {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Bool(b) => Ok(*b),
            _ => Err(type_error("Boolean", val)),
        }
    }
}

impl FromValue for String {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::String(s) => Ok(s.clone()),
            _ => Err(type_error("String", val)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Date(d) => Ok(*d),
            _ => Err(type_error("Date", val)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(val: &Value) -> Result<Self> {
        match val {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{d}"),
        }
    }
}

/// Render an index tuple as `(a, b, c)` for messages.
pub(crate) fn format_index<T: fmt::Display>(index: &[T]) -> String {
    let parts: Vec<String> = index.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}
