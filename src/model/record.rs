// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Struct-like host records
//!
//! Record types opt in by implementing [`Record`] and describing their
//! fields and methods once through a [`RecordBuilder`], then invoking
//! [`record_value!`](crate::record_value) to derive the conversions. The
//! resulting [`RecordType`] table (field names, aliases, method signatures)
//! is built on first use and memoized per type for the life of the process.
//!
//! ```
//! use okra_expr::model::{ParamKind, Record, RecordBuilder, ToValue, Value};
//!
//! #[derive(Clone)]
//! struct User {
//!     name: String,
//!     age: i64,
//! }
//!
//! impl Record for User {
//!     fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
//!         builder
//!             .field("Name", |u: &User| &u.name)
//!             .tag("json", "name")
//!             .field("Age", |u: &User| &u.age)
//!             .method("Greet", &[ParamKind::String], |u: &User, args| {
//!                 Ok(format!("{}, {}", args[0], u.name).into())
//!             })
//!     }
//! }
//!
//! okra_expr::record_value!(User);
//!
//! let user = User { name: "Ann".into(), age: 30 }.to_value();
//! assert_eq!(user.member("name"), Some(Value::from("Ann")));
//! ```

use super::reflect::{Member, MethodSignature, ParamKind, Reflect, ToValue};
use super::type_coercion::short_type_name;
use super::value::Value;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

/// Tag consulted first for a field's alternate name
pub const PRIMARY_TAG: &str = "okra";

/// Tag consulted when the primary tag is absent
pub const SECONDARY_TAG: &str = "json";

/// Tag value that hides a field from lookups
pub const IGNORE_MARKER: &str = "-";

/// Result of a host method body
pub type MethodResult = anyhow::Result<Value>;

/// Opt-in for struct-like host types
pub trait Record: Clone + Send + Sync + 'static {
    /// Register fields and methods
    fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self>;
}

trait FieldRead<T>: Send + Sync {
    fn read<'a>(&self, record: &'a T) -> Member<'a>;
}

struct FieldFn<F, V: ?Sized> {
    getter: F,
    _value: PhantomData<fn(&V)>,
}

impl<T, V, F> FieldRead<T> for FieldFn<F, V>
where
    V: ToValue + ?Sized + 'static,
    F: Fn(&T) -> &V + Send + Sync,
{
    fn read<'a>(&self, record: &'a T) -> Member<'a> {
        (self.getter)(record).to_member()
    }
}

type SharedMethod<T> = Box<dyn Fn(&T, Vec<Value>) -> MethodResult + Send + Sync>;
type MutableMethod<T> = Box<dyn Fn(&mut T, Vec<Value>) -> MethodResult + Send + Sync>;

struct FieldDef<T> {
    name: String,
    tags: Vec<(String, String)>,
    getter: Box<dyn FieldRead<T>>,
}

impl<T> FieldDef<T> {
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(tag_key, _)| tag_key == key)
            .map(|(_, value)| value.as_str())
    }

    /// Alternate name from the primary tag, else the secondary one
    ///
    /// `Err(())` means the field carries the ignore marker.
    fn alias(&self) -> Result<Option<&str>, ()> {
        let tag = self
            .tag(PRIMARY_TAG)
            .filter(|tag| !tag.is_empty())
            .or_else(|| self.tag(SECONDARY_TAG));
        match tag {
            Some(IGNORE_MARKER) => Err(()),
            Some(tag) => {
                let name = tag.split(',').next().unwrap_or_default();
                Ok((!name.is_empty()).then_some(name))
            }
            None => Ok(None),
        }
    }
}

enum MethodBody<T> {
    Shared(SharedMethod<T>),
    /// Needs a mutable receiver; runs against a private copy
    Mutable(MutableMethod<T>),
}

struct MethodDef<T> {
    signature: MethodSignature,
    body: MethodBody<T>,
}

/// Collects the description of a record type
pub struct RecordBuilder<T> {
    type_name: String,
    fields: Vec<FieldDef<T>>,
    methods: Vec<MethodDef<T>>,
}

impl<T: Record> RecordBuilder<T> {
    fn new() -> Self {
        Self {
            type_name: short_type_name::<T>(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Override the name reported in error messages
    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = name.into();
        self
    }

    /// Declare a field readable under `name`
    ///
    /// Composite fields are lent to the evaluator, never copied.
    pub fn field<V, F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        V: ToValue + ?Sized + 'static,
        F: Fn(&T) -> &V + Send + Sync + 'static,
    {
        self.fields.push(FieldDef {
            name: name.into(),
            tags: Vec::new(),
            getter: Box::new(FieldFn::<F, V> {
                getter,
                _value: PhantomData,
            }),
        });
        self
    }
    /// Attach a `key:"value"` style tag to the most recently declared field
    ///
    /// The value may carry options after a comma (`"name,omitempty"`); only
    /// the part before the comma is used as an alias. The value `-` hides
    /// the field.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.tags.push((key.into(), value.into()));
        }
        self
    }

    /// Declare a method that returns a value
    pub fn method<F>(mut self, name: impl Into<String>, params: &[ParamKind], body: F) -> Self
    where
        F: Fn(&T, Vec<Value>) -> MethodResult + Send + Sync + 'static,
    {
        self.methods.push(MethodDef {
            signature: MethodSignature::new(name, params),
            body: MethodBody::Shared(Box::new(body)),
        });
        self
    }

    /// Declare a method that needs a mutable receiver
    ///
    /// The method runs against a copy, so the evaluated data never changes.
    pub fn method_mut<F>(mut self, name: impl Into<String>, params: &[ParamKind], body: F) -> Self
    where
        F: Fn(&mut T, Vec<Value>) -> MethodResult + Send + Sync + 'static,
    {
        self.methods.push(MethodDef {
            signature: MethodSignature::new(name, params),
            body: MethodBody::Mutable(Box::new(body)),
        });
        self
    }

    /// Declare a method that produces no value; calls evaluate to nil
    pub fn void_method<F>(mut self, name: impl Into<String>, params: &[ParamKind], body: F) -> Self
    where
        F: Fn(&T, Vec<Value>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut signature = MethodSignature::new(name, params);
        signature.returns_value = false;
        self.methods.push(MethodDef {
            signature,
            body: MethodBody::Shared(Box::new(move |record: &T, args: Vec<Value>| {
                body(record, args).map(|()| Value::Nil)
            })),
        });
        self
    }

    /// Make the most recently declared method accept extra trailing arguments
    pub fn variadic(mut self, kind: ParamKind) -> Self {
        if let Some(method) = self.methods.last_mut() {
            method.signature.variadic = Some(kind);
        }
        self
    }

    fn build(self) -> RecordType<T> {
        let mut lookup = FxHashMap::default();
        for (position, field) in self.fields.iter().enumerate() {
            match field.alias() {
                Err(()) => continue,
                Ok(alias) => {
                    lookup.insert(field.name.clone(), position);
                    if let Some(alias) = alias {
                        lookup.insert(alias.to_string(), position);
                    }
                }
            }
        }

        let methods = self
            .methods
            .into_iter()
            .map(|method| (method.signature.name.clone(), method))
            .collect();

        log::debug!(
            "Built record metadata for {} ({} fields, {} lookup names)",
            self.type_name,
            self.fields.len(),
            lookup.len()
        );

        RecordType {
            type_name: self.type_name,
            fields: self.fields,
            lookup,
            methods,
        }
    }
}

/// Memoized description of a record type
///
/// [`record_value!`](crate::record_value) routes a record's [`Reflect`]
/// implementation through these methods.
pub struct RecordType<T> {
    type_name: String,
    fields: Vec<FieldDef<T>>,
    lookup: FxHashMap<String, usize>,
    methods: FxHashMap<String, MethodDef<T>>,
}

static RECORD_TYPES: Lazy<DashMap<TypeId, &'static (dyn Any + Send + Sync)>> =
    Lazy::new(DashMap::new);

impl<T: Record> RecordType<T> {
    /// Metadata for `T`, built on first request and kept for the process
    pub fn get() -> &'static Self {
        let id = TypeId::of::<T>();
        let cached = RECORD_TYPES.get(&id).map(|entry| *entry.value());
        if let Some(meta) = cached.and_then(|meta| meta.downcast_ref::<Self>()) {
            return meta;
        }

        // Described outside the map lock; a racing builder's copy is dropped
        let built = T::describe(RecordBuilder::new()).build();
        let stored = *RECORD_TYPES
            .entry(id)
            .or_insert_with(move || {
                let meta: &'static Self = Box::leak(Box::new(built));
                meta as &'static (dyn Any + Send + Sync)
            })
            .value();
        match stored.downcast_ref::<Self>() {
            Some(meta) => meta,
            None => Box::leak(Box::new(T::describe(RecordBuilder::new()).build())),
        }
    }

    /// Name reported in error messages
    pub fn name(&self) -> &str {
        &self.type_name
    }

    /// Every name a member lookup accepts, aliases included
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.lookup.keys().map(String::as_str)
    }

    /// Read a field by declared name or alias, falling back to getter sugar
    pub fn member<'a>(&self, record: &'a T, name: &str) -> Option<Member<'a>> {
        if let Some(position) = self.lookup.get(name) {
            return self.fields.get(*position).map(|field| field.getter.read(record));
        }

        // Getter sugar: a zero-argument method referenced without a call
        let method = self.methods.get(name)?;
        if !method.signature.is_getter() {
            return None;
        }
        self.invoke(record, name, Vec::new()).ok().map(Member::Value)
    }

    /// Signature of a declared method
    pub fn signature(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.get(name).map(|method| &method.signature)
    }

    /// Call a declared method; mutating methods run against a copy
    pub fn invoke(&self, record: &T, name: &str, args: Vec<Value>) -> MethodResult {
        let Some(method) = self.methods.get(name) else {
            anyhow::bail!("method {name} not found on {}", self.type_name);
        };
        match &method.body {
            MethodBody::Shared(body) => body(record, args),
            MethodBody::Mutable(body) => {
                let mut receiver = record.clone();
                body(&mut receiver, args)
            }
        }
    }

    /// Field-by-field equality against another object of the same type
    pub fn deep_eq(&self, record: &T, other: &dyn Reflect) -> bool {
        let Some(other) = other.as_any().downcast_ref::<T>() else {
            return false;
        };
        self.fields
            .iter()
            .all(|field| field.getter.read(record) == field.getter.read(other))
    }

    /// Field values in declaration order, `{a b c}`
    pub fn fmt_record(&self, record: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", field.getter.read(record))?;
        }
        f.write_str("}")
    }
}

/// Derive [`Reflect`], [`ToValue`] and [`FromValue`](crate::model::FromValue)
/// for [`Record`] types
///
/// Converting a record by reference copies it once into shared storage;
/// hand over an `Arc` to avoid even that. Records reached through fields or
/// containers are always borrowed.
///
/// ```
/// # use okra_expr::model::{FromValue, Record, RecordBuilder, ToValue};
/// #[derive(Clone, Debug, PartialEq)]
/// struct Point { x: i64 }
///
/// impl Record for Point {
///     fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
///         builder.field("X", |p: &Point| &p.x)
///     }
/// }
///
/// okra_expr::record_value!(Point);
///
/// let value = Point { x: 3 }.to_value();
/// assert_eq!(Point::from_value(value), Ok(Point { x: 3 }));
/// ```
#[macro_export]
macro_rules! record_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::model::Reflect for $ty {
                fn type_name(&self) -> &str {
                    $crate::model::RecordType::<Self>::get().name()
                }

                fn kind(&self) -> $crate::model::ObjectKind {
                    $crate::model::ObjectKind::Record
                }

                fn member(&self, name: &str) -> ::std::option::Option<$crate::model::Member<'_>> {
                    $crate::model::RecordType::<Self>::get().member(self, name)
                }

                fn method(&self, name: &str) -> ::std::option::Option<&$crate::model::MethodSignature> {
                    $crate::model::RecordType::<Self>::get().signature(name)
                }

                fn invoke(
                    &self,
                    name: &str,
                    args: ::std::vec::Vec<$crate::model::Value>,
                ) -> $crate::model::MethodResult {
                    $crate::model::RecordType::<Self>::get().invoke(self, name, args)
                }

                fn deep_eq(&self, other: &dyn $crate::model::Reflect) -> bool {
                    $crate::model::RecordType::<Self>::get().deep_eq(self, other)
                }

                fn fmt_value(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    $crate::model::RecordType::<Self>::get().fmt_record(self, f)
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }
            }

            impl $crate::model::ToValue for $ty {
                fn to_value(&self) -> $crate::model::Value {
                    $crate::model::Value::object(::std::clone::Clone::clone(self))
                }

                fn to_member(&self) -> $crate::model::Member<'_> {
                    $crate::model::Member::Object(self)
                }
            }

            impl $crate::model::FromValue for $ty {
                fn from_value(
                    value: $crate::model::Value,
                ) -> $crate::model::ConversionResult<Self> {
                    $crate::model::type_coercion::downcast_cloned(value)
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FromValue, ObjectKind};
    use pretty_assertions::assert_eq;

    #[derive(Clone, Debug, PartialEq)]
    struct Tagged {
        name: String,
        real: String,
        hidden: i64,
        plain: i64,
    }

    impl Record for Tagged {
        fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
            builder
                .field("Name", |t: &Tagged| &t.name)
                .tag("json", "name_tag,omitempty")
                .field("Real", |t: &Tagged| &t.real)
                .tag("okra", "real_name")
                .tag("json", "ignored_alias")
                .field("Hidden", |t: &Tagged| &t.hidden)
                .tag("okra", "-")
                .field("Plain", |t: &Tagged| &t.plain)
                .method("Describe", &[], |t: &Tagged, _| Ok(t.name.clone().into()))
                .method("Echo", &[ParamKind::Any], |_: &Tagged, args| Ok(args[0].clone()))
                .method_mut("Bump", &[], |t: &mut Tagged, _| {
                    t.plain += 1;
                    Ok(Value::Integer(t.plain))
                })
                .void_method("Nothing", &[], |_: &Tagged, _| Ok(()))
        }
    }

    #[derive(Clone)]
    struct Holder {
        inner: Tagged,
        list: Vec<i64>,
    }

    impl Record for Holder {
        fn describe(builder: RecordBuilder<Self>) -> RecordBuilder<Self> {
            builder
                .field("Inner", |h: &Holder| &h.inner)
                .field("List", |h: &Holder| &h.list)
        }
    }

    crate::record_value!(Tagged, Holder);

    fn sample() -> Tagged {
        Tagged {
            name: "n".into(),
            real: "r".into(),
            hidden: 7,
            plain: 1,
        }
    }

    #[test]
    fn test_declared_names_and_aliases() {
        let record = sample().to_value();
        assert_eq!(record.member("Name"), Some(Value::from("n")));
        assert_eq!(record.member("name_tag"), Some(Value::from("n")));
        assert_eq!(record.member("Real"), Some(Value::from("r")));
        assert_eq!(record.member("real_name"), Some(Value::from("r")));
        assert_eq!(record.member("ignored_alias"), None);
        assert_eq!(record.member("Plain"), Some(Value::Integer(1)));
        assert_eq!(record.object_kind(), Some(ObjectKind::Record));
    }

    #[test]
    fn test_ignore_marker_hides_field() {
        let record = sample().to_value();
        assert_eq!(record.member("Hidden"), None);
        assert_eq!(record.member("-"), None);
    }

    #[test]
    fn test_getter_sugar() {
        let record = sample().to_value();
        assert_eq!(record.member("Describe"), Some(Value::from("n")));
        assert_eq!(record.member("Bump"), Some(Value::Integer(2)));
        // Needs an argument, or produces nothing
        assert_eq!(record.member("Echo"), None);
        assert_eq!(record.member("Nothing"), None);
        // The copy was bumped, not the record
        assert_eq!(record.downcast_ref::<Tagged>().map(|t| t.plain), Some(1));
    }

    #[test]
    fn test_composite_fields_are_borrowed() {
        let holder = Holder {
            inner: sample(),
            list: vec![4, 5],
        };
        let meta = RecordType::<Holder>::get();
        let Some(Member::Object(inner)) = meta.member(&holder, "Inner") else {
            panic!("Inner should be lent out");
        };
        assert!(std::ptr::eq(
            inner.as_any().downcast_ref::<Tagged>().unwrap(),
            &holder.inner
        ));
        assert!(matches!(meta.member(&holder, "List"), Some(Member::Object(_))));

        let value = holder.to_value();
        let inner = value.member("Inner").unwrap();
        assert_eq!(inner.member("Plain"), Some(Value::Integer(1)));
        assert_eq!(Tagged::from_value(inner), Ok(sample()));
    }

    #[test]
    fn test_metadata_is_memoized() {
        let first = RecordType::<Tagged>::get();
        let second = RecordType::<Tagged>::get();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.name(), "Tagged");

        let mut names: Vec<_> = first.member_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Name", "Plain", "Real", "name_tag", "real_name"]);
    }

    #[test]
    fn test_textual_form_and_equality() {
        let record = sample().to_value();
        assert_eq!(record.to_string(), "{n r 7 1}");
        assert_eq!(record, sample().to_value());
        assert!(sample().deep_eq(&sample()));
        assert!(!sample().deep_eq(&vec![1]));
    }

    #[test]
    fn test_conversion_back_to_the_record() {
        assert_eq!(Tagged::from_value(sample().to_value()), Ok(sample()));
        assert!(Tagged::from_value(Value::Integer(1)).is_err());
        assert!(Tagged::from_value(vec![1].to_value()).is_err());
    }
}
