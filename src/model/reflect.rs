//! Introspection contract for host values
//!
//! The evaluator never inspects host data directly. Anything it can reach
//! through member access, indexing or method calls implements [`Reflect`],
//! and anything a host hands to the engine implements [`ToValue`].
//!
//! Lookups hand back a [`Member`]: composites are borrowed from their parent
//! rather than converted, so walking into host data never copies it.

use super::object::ObjectRef;
use super::value::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Structural shape of a host object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Struct-like value with named fields and methods
    Record,
    /// Keyed collection
    Map,
    /// Ordered collection
    Sequence,
}

/// Declared kind of a method parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Boolean parameter
    Bool,
    /// Integer parameter (floats truncate)
    Int,
    /// Float parameter (integers widen)
    Float,
    /// String parameter
    String,
    /// Host object parameter
    Object,
    /// Any value, passed through unchanged
    Any,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int64",
            Self::Float => "float64",
            Self::String => "string",
            Self::Object => "object",
            Self::Any => "any",
        };
        f.write_str(name)
    }
}

/// Shape of a callable host method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Fixed parameter kinds, in order
    pub params: Vec<ParamKind>,
    /// Kind of the trailing variadic parameter, if any
    pub variadic: Option<ParamKind>,
    /// Whether the method produces a result value
    pub returns_value: bool,
}

impl MethodSignature {
    /// Signature with fixed parameters that produces a value
    pub fn new(name: impl Into<String>, params: &[ParamKind]) -> Self {
        Self {
            name: name.into(),
            params: params.to_vec(),
            variadic: None,
            returns_value: true,
        }
    }

    /// Minimum number of arguments accepted
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether the method accepts trailing extra arguments
    pub fn is_variadic(&self) -> bool {
        self.variadic.is_some()
    }

    /// Declared kind for the argument at `position`
    pub fn param_kind(&self, position: usize) -> Option<ParamKind> {
        self.params.get(position).copied().or(self.variadic)
    }

    /// Getter sugar applies to zero-argument methods that return something
    pub fn is_getter(&self) -> bool {
        self.params.is_empty() && self.variadic.is_none() && self.returns_value
    }
}

/// Result of a member or index lookup on a host object
#[derive(Clone)]
pub enum Member<'a> {
    /// Scalar, or a value the lookup produced on its own
    Value(Value),
    /// Composite borrowed from the receiver
    Object(&'a dyn Reflect),
}

impl PartialEq for Member<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.deep_eq(*b),
            (Self::Value(Value::Object(a)), Self::Object(b))
            | (Self::Object(b), Self::Value(Value::Object(a))) => {
                a.get().is_some_and(|a| a.deep_eq(*b))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Object(object) => object.fmt_value(f),
        }
    }
}

impl fmt::Debug for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "Value({value:?})"),
            Self::Object(object) => write!(f, "Object({}: {self})", object.type_name()),
        }
    }
}

/// Capability interface every host object exposes to the evaluator
///
/// All lookups are total: a missing member, key or element is `None`, never
/// an error. Only method invocation can fail.
pub trait Reflect: Send + Sync + 'static {
    /// Name used in error messages
    fn type_name(&self) -> &str;

    /// Structural shape
    fn kind(&self) -> ObjectKind;

    /// Resolve `receiver.name`
    fn member(&self, _name: &str) -> Option<Member<'_>> {
        None
    }

    /// Resolve `receiver[key]`
    fn index(&self, _key: &Value) -> Option<Member<'_>> {
        None
    }

    /// Element or entry count for maps and sequences
    fn len(&self) -> Option<usize> {
        None
    }

    /// True when the object reports a length of zero
    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Map keys, each usable with [`Reflect::index`]
    fn keys(&self) -> Vec<Value> {
        Vec::new()
    }

    /// Look up a callable method by name
    fn method(&self, _name: &str) -> Option<&MethodSignature> {
        None
    }

    /// Invoke a method previously found through [`Reflect::method`]
    ///
    /// Arguments have already been checked against the signature.
    fn invoke(&self, name: &str, _args: Vec<Value>) -> anyhow::Result<Value> {
        anyhow::bail!("method {name} not found on {}", self.type_name())
    }

    /// Deep structural equality against another host object
    fn deep_eq(&self, other: &dyn Reflect) -> bool;

    /// Default textual form
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Access to the concrete type for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Conversion of host data into a dynamic [`Value`]
///
/// Unsigned integers widen to `i64` with two's-complement wrapping, `None`
/// becomes nil, and smart pointers are transparent.
pub trait ToValue {
    /// Produce the dynamic value for `self`
    ///
    /// Composites are copied into shared storage; pass an `Arc` to avoid it.
    fn to_value(&self) -> Value;

    /// Lookup result for `self` when reached inside a parent object
    ///
    /// Composites override this to lend themselves out instead of copying.
    fn to_member(&self) -> Member<'_> {
        Member::Value(self.to_value())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::Nil
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

macro_rules! impl_to_value_integer {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                #[inline]
                fn to_value(&self) -> Value {
                    Value::Integer(*self as i64)
                }
            }
        )*
    };
}

impl_to_value_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Nil, ToValue::to_value)
    }

    fn to_member(&self) -> Member<'_> {
        match self {
            Some(value) => value.to_member(),
            None => Member::Value(Value::Nil),
        }
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn to_member(&self) -> Member<'_> {
        (**self).to_member()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn to_member(&self) -> Member<'_> {
        (**self).to_member()
    }
}

/// Shared host objects are handed over without copying
impl<T: Reflect> ToValue for Arc<T> {
    fn to_value(&self) -> Value {
        Value::Object(ObjectRef::new(Arc::clone(self) as Arc<dyn Reflect>))
    }

    fn to_member(&self) -> Member<'_> {
        Member::Object(self.as_ref())
    }
}

impl ToValue for Arc<dyn Reflect> {
    fn to_value(&self) -> Value {
        Value::Object(ObjectRef::new(Arc::clone(self)))
    }

    fn to_member(&self) -> Member<'_> {
        Member::Object(self.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(7u8.to_value(), Value::Integer(7));
        assert_eq!(u64::MAX.to_value(), Value::Integer(-1));
        assert_eq!(1.5f32.to_value(), Value::Float(1.5));
        assert_eq!("x".to_value(), Value::String("x".into()));
        assert_eq!(Some(3).to_value(), Value::Integer(3));
        assert_eq!(None::<i32>.to_value(), Value::Nil);
        assert_eq!(Box::new(Some(true)).to_value(), Value::Boolean(true));
        assert_eq!(().to_value(), Value::Nil);
    }

    #[test]
    fn test_signature_helpers() {
        let mut signature = MethodSignature::new("Join", &[ParamKind::String]);
        assert!(!signature.is_variadic());
        assert_eq!(signature.param_kind(1), None);

        signature.variadic = Some(ParamKind::Any);
        assert_eq!(signature.arity(), 1);
        assert_eq!(signature.param_kind(0), Some(ParamKind::String));
        assert_eq!(signature.param_kind(3), Some(ParamKind::Any));
        assert!(!signature.is_getter());
        assert!(MethodSignature::new("Name", &[]).is_getter());
    }

    #[test]
    fn test_composites_are_lent_out() {
        let shared = Arc::new(vec![1, 2]);
        let Member::Object(object) = shared.to_member() else {
            panic!("a shared sequence should be borrowed");
        };
        assert!(std::ptr::eq(
            object.as_any().downcast_ref::<Vec<i32>>().unwrap(),
            shared.as_ref()
        ));
        assert_eq!(Some(7).to_member(), Member::Value(Value::Integer(7)));
        assert_eq!(object.index(&Value::Integer(1)), Some(Member::Value(Value::Integer(2))));
    }
}
