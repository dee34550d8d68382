//! Coercion rules between dynamic values and host types

use super::object::ObjectRef;
use super::reflect::{ObjectKind, ParamKind, Reflect};
use super::value::Value;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use thiserror::Error;

/// Errors converting an evaluation result into a host type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The dynamic result has no conversion to the requested type
    #[error("result type {actual} is not compatible with target type {target}")]
    Incompatible {
        /// Dynamic type of the result
        actual: String,
        /// Requested host type
        target: String,
    },

    /// The result converts but does not fit the requested type
    #[error("value {value} is out of range for target type {target}")]
    OutOfRange {
        /// Textual form of the result
        value: String,
        /// Requested host type
        target: String,
    },
}

/// Result type for conversions
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Integer view of a value; only integers qualify
pub fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        _ => None,
    }
}

/// Float view of a value
///
/// Integers widen, floats pass through, strings parse.
pub fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

/// Truthiness used by `!`, `&&`, `||` and the ternary condition
///
/// Nil is false, a string is true unless empty or `"false"`, numbers are
/// true when non-zero, and anything else is false.
pub fn to_truth(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Boolean(b) => *b,
        Value::String(s) => !s.is_empty() && s != "false",
        other => to_float(other).is_some_and(|f| f != 0.0),
    }
}

impl ParamKind {
    /// Coerce a call argument to this parameter kind
    ///
    /// Nil becomes the kind's zero value. `None` means the argument cannot
    /// be used for this parameter.
    pub fn convert(self, value: Value) -> Option<Value> {
        match (self, value) {
            (Self::Any, value) => Some(value),
            (kind, Value::Nil) => Some(kind.zero_value()),
            (Self::Bool, value @ Value::Boolean(_)) => Some(value),
            (Self::Int, value @ Value::Integer(_)) => Some(value),
            (Self::Int, Value::Float(f)) => Some(Value::Integer(f as i64)),
            (Self::Float, Value::Integer(i)) => Some(Value::Float(i as f64)),
            (Self::Float, value @ Value::Float(_)) => Some(value),
            (Self::String, value @ Value::String(_)) => Some(value),
            (Self::Object, value @ Value::Object(_)) => Some(value),
            _ => None,
        }
    }

    /// Value passed for a nil argument
    pub fn zero_value(self) -> Value {
        match self {
            Self::Bool => Value::Boolean(false),
            Self::Int => Value::Integer(0),
            Self::Float => Value::Float(0.0),
            Self::String => Value::String(String::new()),
            Self::Object | Self::Any => Value::Nil,
        }
    }
}

/// Conversion of an evaluation result into a host type
///
/// Exact matches are taken directly; numeric targets additionally accept
/// any value with an integer or float view, with floats truncating toward
/// zero when an integer is requested. Collections convert element by
/// element, and records convert through
/// [`record_value!`](crate::record_value).
pub trait FromValue: Sized {
    /// Convert the dynamic value
    fn from_value(value: Value) -> ConversionResult<Self>;
}

/// Type name with module paths stripped (`Vec<ObjectRef>`)
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut path_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(path_start);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            path_start = out.len();
        }
    }
    out
}

fn incompatible<T: ?Sized>(value: &Value) -> ConversionError {
    ConversionError::Incompatible {
        actual: value.type_name().to_string(),
        target: short_type_name::<T>(),
    }
}

fn out_of_range<T: ?Sized>(value: &Value) -> ConversionError {
    ConversionError::OutOfRange {
        value: value.to_string(),
        target: short_type_name::<T>(),
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> ConversionResult<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> ConversionResult<Self> {
        value.as_bool().ok_or_else(|| incompatible::<bool>(&value))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(incompatible::<String>(&other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> ConversionResult<Self> {
        to_float(&value).ok_or_else(|| incompatible::<f64>(&value))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> ConversionResult<Self> {
        to_float(&value)
            .map(|f| f as f32)
            .ok_or_else(|| incompatible::<f32>(&value))
    }
}

macro_rules! impl_from_value_integer {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> ConversionResult<Self> {
                    let wide = match to_integer(&value) {
                        Some(i) => i128::from(i),
                        None => {
                            let f = to_float(&value).ok_or_else(|| incompatible::<$ty>(&value))?;
                            if !f.is_finite() {
                                return Err(out_of_range::<$ty>(&value));
                            }
                            f.trunc() as i128
                        }
                    };
                    <$ty>::try_from(wide).map_err(|_| out_of_range::<$ty>(&value))
                }
            }
        )*
    };
}

impl_from_value_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Object(object) => Ok(object),
            other => Err(incompatible::<Self>(&other)),
        }
    }
}

/// Copy of the host object behind `value`, when it has type `T`
pub fn downcast_cloned<T: Reflect + Clone>(value: Value) -> ConversionResult<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| incompatible::<T>(&value))
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> ConversionResult<Self> {
        let len = value
            .as_object()
            .filter(|object| object.kind() == ObjectKind::Sequence)
            .and_then(|object| object.len())
            .ok_or_else(|| incompatible::<Self>(&value))?;
        (0..len)
            .map(|i| T::from_value(value.index(&Value::Integer(i as i64)).unwrap_or_default()))
            .collect()
    }
}

fn collect_entries<M, K, V>(value: Value) -> ConversionResult<M>
where
    M: FromIterator<(K, V)>,
    K: FromValue,
    V: FromValue,
{
    let keys = value
        .as_object()
        .filter(|object| object.kind() == ObjectKind::Map)
        .map(|object| object.keys())
        .ok_or_else(|| incompatible::<M>(&value))?;
    keys.into_iter()
        .map(|key| {
            let entry = value.index(&key).unwrap_or_default();
            Ok((K::from_value(key)?, V::from_value(entry)?))
        })
        .collect()
}

impl<K, V, S> FromValue for HashMap<K, V, S>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: Value) -> ConversionResult<Self> {
        collect_entries(value)
    }
}

impl<K, V, S> FromValue for IndexMap<K, V, S>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: Value) -> ConversionResult<Self> {
        collect_entries(value)
    }
}

impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value) -> ConversionResult<Self> {
        collect_entries(value)
    }
}
