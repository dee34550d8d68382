//! Derived introspection for standard containers
//!
//! Sequences (`Vec`, `VecDeque`, arrays, slices) and maps (`HashMap`,
//! `BTreeMap`, `IndexMap`) become host objects without any opt-in, as do
//! `serde_json` documents. Converting a container by reference clones it into
//! shared storage once; nested containers and records are lent out on access
//! and scalars convert lazily.

use super::object::ObjectRef;
use super::reflect::{Member, ObjectKind, Reflect, ToValue};
use super::value::Value;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::any::Any;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// Name reported for sequence-like objects
pub const SEQUENCE_TYPE_NAME: &str = "sequence";

/// Name reported for map-like objects
pub const MAP_TYPE_NAME: &str = "map";

/// Key kinds a map-like container may use
///
/// Member keys (`m.key`) always arrive as strings; index keys (`m[expr]`)
/// arrive as evaluated values and coerce more liberally. A key that cannot
/// be converted resolves to nil at the call site.
pub trait MapKey: ToValue + Sized {
    /// Key for `receiver.name`
    fn from_member(name: &str) -> Option<Self>;

    /// Key for `receiver[key]`; nil maps to the zero value
    fn from_index(key: &Value) -> Option<Self>;
}

impl MapKey for String {
    fn from_member(name: &str) -> Option<Self> {
        Some(name.to_string())
    }

    fn from_index(key: &Value) -> Option<Self> {
        match key {
            Value::Nil => Some(String::new()),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl MapKey for bool {
    fn from_member(_name: &str) -> Option<Self> {
        None
    }

    fn from_index(key: &Value) -> Option<Self> {
        match key {
            Value::Nil => Some(false),
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

macro_rules! impl_map_key_signed {
    ($($ty:ty),*) => {
        $(
            impl MapKey for $ty {
                fn from_member(name: &str) -> Option<Self> {
                    name.parse::<i64>().ok().and_then(|i| <$ty>::try_from(i).ok())
                }

                fn from_index(key: &Value) -> Option<Self> {
                    match key {
                        Value::Nil => Some(0),
                        Value::Integer(i) => <$ty>::try_from(*i).ok(),
                        Value::Float(f) => Some(*f as $ty),
                        Value::String(s) => {
                            s.parse::<i64>().ok().and_then(|i| <$ty>::try_from(i).ok())
                        }
                        _ => None,
                    }
                }
            }
        )*
    };
}

macro_rules! impl_map_key_unsigned {
    ($($ty:ty),*) => {
        $(
            impl MapKey for $ty {
                fn from_member(name: &str) -> Option<Self> {
                    name.parse::<i64>().ok().and_then(|i| <$ty>::try_from(i).ok())
                }

                fn from_index(key: &Value) -> Option<Self> {
                    match key {
                        Value::Nil => Some(0),
                        Value::Integer(i) => <$ty>::try_from(*i).ok(),
                        Value::Float(f) => Some(*f as $ty),
                        Value::String(s) => {
                            s.parse::<u64>().ok().and_then(|u| <$ty>::try_from(u).ok())
                        }
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_map_key_signed!(i8, i16, i32, i64, isize);
impl_map_key_unsigned!(u8, u16, u32, u64, usize);

fn sequence_position(key: &Value) -> Option<usize> {
    match key {
        Value::Integer(i) => usize::try_from(*i).ok(),
        _ => None,
    }
}

fn member_position(name: &str) -> Option<usize> {
    name.parse::<usize>().ok()
}

fn sequence_eq(this: &dyn Reflect, other: &dyn Reflect) -> bool {
    if other.kind() != ObjectKind::Sequence || this.len() != other.len() {
        return false;
    }
    let len = this.len().unwrap_or_default();
    (0..len).all(|i| {
        let key = Value::Integer(i as i64);
        match (this.index(&key), other.index(&key)) {
            (Some(a), Some(b)) => a == b,
            (a, b) => a.is_none() && b.is_none(),
        }
    })
}

fn fmt_sequence<'a, T: ToValue + 'a>(
    items: impl Iterator<Item = &'a T>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item.to_member())?;
    }
    f.write_str("]")
}

/// Key ordering for textual output: numbers numerically, the rest by text
fn key_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn fmt_entries<'a, K: ToValue + 'a, V: ToValue + 'a>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let mut pairs: Vec<(Value, Member<'a>)> = entries
        .map(|(key, value)| (key.to_value(), value.to_member()))
        .collect();
    pairs.sort_by(|a, b| key_order(&a.0, &b.0));

    f.write_str("map[")?;
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{key}:{value}")?;
    }
    f.write_str("]")
}

fn entries_eq<'a, K: ToValue + 'a, V: ToValue + 'a>(
    mut entries: impl Iterator<Item = (&'a K, &'a V)>,
    len: usize,
    other: &dyn Reflect,
) -> bool {
    other.kind() == ObjectKind::Map
        && other.len() == Some(len)
        && entries.all(|(key, value)| {
            other
                .index(&key.to_value())
                .is_some_and(|found| found == value.to_member())
        })
}

impl<T: ToValue + Send + Sync + 'static> Reflect for Vec<T> {
    fn type_name(&self) -> &str {
        SEQUENCE_TYPE_NAME
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Sequence
    }

    fn member(&self, name: &str) -> Option<Member<'_>> {
        self.as_slice().get(member_position(name)?).map(ToValue::to_member)
    }

    fn index(&self, key: &Value) -> Option<Member<'_>> {
        self.as_slice().get(sequence_position(key)?).map(ToValue::to_member)
    }

    fn len(&self) -> Option<usize> {
        Some(Vec::len(self))
    }

    fn deep_eq(&self, other: &dyn Reflect) -> bool {
        sequence_eq(self, other)
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_sequence(self.iter(), f)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: ToValue + Send + Sync + 'static, const N: usize> Reflect for [T; N] {
    fn type_name(&self) -> &str {
        SEQUENCE_TYPE_NAME
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Sequence
    }

    fn member(&self, name: &str) -> Option<Member<'_>> {
        self.as_slice().get(member_position(name)?).map(ToValue::to_member)
    }

    fn index(&self, key: &Value) -> Option<Member<'_>> {
        self.as_slice().get(sequence_position(key)?).map(ToValue::to_member)
    }

    fn len(&self) -> Option<usize> {
        Some(N)
    }

    fn deep_eq(&self, other: &dyn Reflect) -> bool {
        sequence_eq(self, other)
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_sequence(self.as_slice().iter(), f)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: ToValue + Send + Sync + 'static> Reflect for VecDeque<T> {
    fn type_name(&self) -> &str {
        SEQUENCE_TYPE_NAME
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Sequence
    }

    fn member(&self, name: &str) -> Option<Member<'_>> {
        VecDeque::get(self, member_position(name)?).map(ToValue::to_member)
    }

    fn index(&self, key: &Value) -> Option<Member<'_>> {
        VecDeque::get(self, sequence_position(key)?).map(ToValue::to_member)
    }

    fn len(&self) -> Option<usize> {
        Some(VecDeque::len(self))
    }

    fn deep_eq(&self, other: &dyn Reflect) -> bool {
        sequence_eq(self, other)
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_sequence(VecDeque::iter(self), f)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn shared<R: Reflect>(object: R) -> Value {
    Value::Object(ObjectRef::new(Arc::new(object)))
}

impl<T: ToValue + Clone + Send + Sync + 'static> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        shared(self.clone())
    }

    fn to_member(&self) -> Member<'_> {
        Member::Object(self)
    }
}

/// Slices are unsized and cannot be lent out; they copy into a `Vec`
impl<T: ToValue + Clone + Send + Sync + 'static> ToValue for [T] {
    fn to_value(&self) -> Value {
        shared(self.to_vec())
    }
}

impl<T: ToValue + Clone + Send + Sync + 'static, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        shared(self.clone())
    }

    fn to_member(&self) -> Member<'_> {
        Member::Object(self)
    }
}

impl<T: ToValue + Clone + Send + Sync + 'static> ToValue for VecDeque<T> {
    fn to_value(&self) -> Value {
        shared(self.clone())
    }

    fn to_member(&self) -> Member<'_> {
        Member::Object(self)
    }
}

macro_rules! impl_reflect_map {
    ($(impl<$($param:ident),+> $map:ty where [$($bounds:tt)+];)+) => {
        $(
            impl<$($param),+> Reflect for $map
            where
                $($bounds)+
            {
                fn type_name(&self) -> &str {
                    MAP_TYPE_NAME
                }

                fn kind(&self) -> ObjectKind {
                    ObjectKind::Map
                }

                fn member(&self, name: &str) -> Option<Member<'_>> {
                    let key = K::from_member(name)?;
                    <$map>::get(self, &key).map(ToValue::to_member)
                }

                fn index(&self, key: &Value) -> Option<Member<'_>> {
                    let key = K::from_index(key)?;
                    <$map>::get(self, &key).map(ToValue::to_member)
                }

                fn len(&self) -> Option<usize> {
                    Some(<$map>::len(self))
                }

                fn keys(&self) -> Vec<Value> {
                    <$map>::keys(self).map(ToValue::to_value).collect()
                }

                fn deep_eq(&self, other: &dyn Reflect) -> bool {
                    entries_eq(<$map>::iter(self), <$map>::len(self), other)
                }

                fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt_entries(<$map>::iter(self), f)
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }
            }

            impl<$($param),+> ToValue for $map
            where
                $($bounds)+,
                Self: Clone,
            {
                fn to_value(&self) -> Value {
                    shared(self.clone())
                }

                fn to_member(&self) -> Member<'_> {
                    Member::Object(self)
                }
            }
        )+
    };
}

impl_reflect_map! {
    impl<K, V, S> HashMap<K, V, S> where [
        K: MapKey + Eq + Hash + Send + Sync + 'static,
        V: ToValue + Send + Sync + 'static,
        S: BuildHasher + Send + Sync + 'static
    ];
    impl<K, V, S> IndexMap<K, V, S> where [
        K: MapKey + Eq + Hash + Send + Sync + 'static,
        V: ToValue + Send + Sync + 'static,
        S: BuildHasher + Send + Sync + 'static
    ];
    impl<K, V> BTreeMap<K, V> where [
        K: MapKey + Ord + Send + Sync + 'static,
        V: ToValue + Send + Sync + 'static
    ];
}

impl Reflect for serde_json::Map<String, JsonValue> {
    fn type_name(&self) -> &str {
        MAP_TYPE_NAME
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Map
    }

    fn member(&self, name: &str) -> Option<Member<'_>> {
        serde_json::Map::get(self, name).map(ToValue::to_member)
    }

    fn index(&self, key: &Value) -> Option<Member<'_>> {
        let key = String::from_index(key)?;
        serde_json::Map::get(self, &key).map(ToValue::to_member)
    }

    fn len(&self) -> Option<usize> {
        Some(serde_json::Map::len(self))
    }

    fn keys(&self) -> Vec<Value> {
        serde_json::Map::keys(self).map(ToValue::to_value).collect()
    }

    fn deep_eq(&self, other: &dyn Reflect) -> bool {
        entries_eq(serde_json::Map::iter(self), serde_json::Map::len(self), other)
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_entries(serde_json::Map::iter(self), f)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// JSON documents as host data
///
/// Numbers become integers when they fit `i64`, floats otherwise. Arrays and
/// objects below the root are borrowed from the document.
impl ToValue for JsonValue {
    fn to_value(&self) -> Value {
        match self {
            JsonValue::Null => Value::Nil,
            JsonValue::Bool(b) => Value::Boolean(*b),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or_default(),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => shared(items.clone()),
            JsonValue::Object(entries) => shared(entries.clone()),
        }
    }

    fn to_member(&self) -> Member<'_> {
        match self {
            JsonValue::Array(items) => Member::Object(items),
            JsonValue::Object(entries) => Member::Object(entries),
            scalar => Member::Value(scalar.to_value()),
        }
    }
}
