//! Dynamic value type produced by evaluation

use super::object::ObjectRef;
use super::reflect::{ObjectKind, Reflect};
use std::fmt;
use std::sync::Arc;

/// Runtime result of evaluating any expression node
///
/// Composite host data is never copied into a closed value type; it is kept
/// behind [`Value::Object`] and introspected through [`Reflect`]. Cloning a
/// value never copies host data.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Nil,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// String value
    String(String),
    /// Opaque reference to host data (record, map, or sequence)
    Object(ObjectRef),
}

impl Value {
    /// Take ownership of a host object and wrap it
    pub fn object<R: Reflect>(value: R) -> Self {
        Self::Object(ObjectRef::new(Arc::new(value)))
    }

    /// Check if this value is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Get boolean value if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value if this is a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the host object if this is one
    pub fn as_object(&self) -> Option<&dyn Reflect> {
        match self {
            Self::Object(object) => object.get(),
            _ => None,
        }
    }

    /// Resolve `self.name`; `None` for scalars and missing members
    pub fn member(&self, name: &str) -> Option<Value> {
        match self {
            Self::Object(object) => object.member(name),
            _ => None,
        }
    }

    /// Resolve `self[key]`; `None` for scalars and missing entries
    pub fn index(&self, key: &Value) -> Option<Value> {
        match self {
            Self::Object(object) => object.index(key),
            _ => None,
        }
    }

    /// Borrow the host object as its concrete type
    pub fn downcast_ref<R: Reflect>(&self) -> Option<&R> {
        self.as_object()?.as_any().downcast_ref::<R>()
    }

    /// Structural kind of a host object
    pub fn object_kind(&self) -> Option<ObjectKind> {
        self.as_object().map(|object| object.kind())
    }

    /// Name of the dynamic type, used in error messages
    pub fn type_name(&self) -> &str {
        match self {
            Self::Nil => "nil",
            Self::Boolean(_) => "bool",
            Self::Integer(_) => "int64",
            Self::Float(_) => "float64",
            Self::String(_) => "string",
            Self::Object(object) => object.type_name(),
        }
    }
}

/// Default textual form, used by string concatenation
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("<nil>"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
            Self::Object(object) => write!(f, "{object}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("Nil"),
            Self::Boolean(b) => write!(f, "Boolean({b})"),
            Self::Integer(i) => write!(f, "Integer({i})"),
            Self::Float(v) => write!(f, "Float({v:?})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Object(object) => write!(f, "Object({}: {self})", object.type_name()),
        }
    }
}

/// Deep structural equality; no numeric promotion happens here
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}
