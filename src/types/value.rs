//! Dynamic payload carried by futures.
//!
//! Fulfillment values and rejection reasons share one type so that a chain
//! of reactions may change the payload shape at every step, the same way an
//! interpreter's promise would. Compound variants are reference counted;
//! cloning a [`Value`] never deep-copies.

use crate::error::AggregateError;
use crate::future::Thenable;
use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

/// A dynamically typed value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value; also the payload of a pending future.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Immutable string.
    Str(Rc<str>),
    /// Ordered sequence.
    List(Rc<[Value]>),
    /// String-keyed record (e.g. `{status, value}` outcome records).
    Record(Rc<BTreeMap<String, Value>>),
    /// Composite rejection reason produced by `any_of`.
    Aggregate(Rc<AggregateError>),
    /// Anything exposing the future contract; adopted when used to complete
    /// a future.
    Thenable(Rc<dyn Thenable>),
}

impl Value {
    /// Builds a list value.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a record value.
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Record(Rc::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Returns a short name for the variant.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Record(_) => "record",
            Self::Aggregate(_) => "aggregate",
            Self::Thenable(_) => "thenable",
        }
    }

    /// Returns true for [`Value::Undefined`].
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns true if the value exposes the future contract.
    #[must_use]
    pub const fn is_thenable(&self) -> bool {
        matches!(self, Self::Thenable(_))
    }

    /// Returns the boolean, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if any.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as a float; integers are widened.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns the string slice, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list items, if any.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the aggregate error, if any.
    #[must_use]
    pub fn as_aggregate(&self) -> Option<&AggregateError> {
        match self {
            Self::Aggregate(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the thenable, if any.
    #[must_use]
    pub fn as_thenable(&self) -> Option<&Rc<dyn Thenable>> {
        match self {
            Self::Thenable(t) => Some(t),
            _ => None,
        }
    }

    /// Looks up a record field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Record(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Converts a JSON document into a value.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::from(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Record(Rc::new(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            )),
        }
    }

    /// Converts into JSON.
    ///
    /// Returns `None` when the value (or anything nested in it) is a
    /// thenable or a non-finite float. `Undefined` maps to `null`.
    #[must_use]
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Self::Undefined | Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Float(x) => serde_json::Value::Number(serde_json::Number::from_f64(*x)?),
            Self::Str(s) => serde_json::Value::String(s.to_string()),
            Self::List(items) => serde_json::Value::Array(
                items.iter().map(Self::to_json).collect::<Option<_>>()?,
            ),
            Self::Record(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect::<Option<_>>()?,
            ),
            Self::Aggregate(err) => {
                let errors = err
                    .errors()
                    .iter()
                    .map(Self::to_json)
                    .collect::<Option<Vec<_>>>()?;
                let mut map = serde_json::Map::new();
                map.insert("message".into(), err.message().into());
                map.insert("errors".into(), serde_json::Value::Array(errors));
                serde_json::Value::Object(map)
            }
            Self::Thenable(_) => return None,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Aggregate(a), Self::Aggregate(b)) => a == b,
            // Thenables compare by identity.
            (Self::Thenable(a), Self::Thenable(b)) => std::ptr::eq(a.identity(), b.identity()),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Aggregate(err) => write!(f, "AggregateError: {err}"),
            Self::Thenable(t) => write!(f, "{t:?}"),
        }
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(Rc::from(items))
    }
}

impl From<AggregateError> for Value {
    fn from(err: AggregateError) -> Self {
        Self::Aggregate(Rc::new(err))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_variants() {
        assert_eq!(Value::from(1), Value::Int(1));
        assert_eq!(Value::from("E").as_str(), Some("E"));
        assert_eq!(Value::from(()), Value::Undefined);
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::list([1, 2]).as_list().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn int_and_float_are_distinct() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
    }

    #[test]
    fn display_renders_nested_values() {
        let v = Value::list([Value::from(1), Value::from("a"), Value::Undefined]);
        assert_eq!(v.to_string(), "[1, a, undefined]");
        let r = Value::record([("status", Value::from("fulfilled"))]);
        assert_eq!(r.to_string(), "{status: fulfilled}");
    }

    #[test]
    fn json_interop() {
        let json = serde_json::json!({"a": [1, 2.5, "x", null, true]});
        let value = Value::from_json(json.clone());
        let items = value.get("a").and_then(Value::as_list).unwrap();
        assert_eq!(items[0], Value::Int(1));
        assert_eq!(items[1], Value::Float(2.5));
        assert_eq!(value.to_json(), Some(json));
    }

    #[test]
    fn json_rejects_non_finite_floats() {
        assert_eq!(Value::Float(f64::NAN).to_json(), None);
        assert_eq!(Value::Undefined.to_json(), Some(serde_json::Value::Null));
    }
}
