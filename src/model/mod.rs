//! Data model for evaluation
//!
//! This module provides the dynamic [`Value`] type, the [`Reflect`]
//! introspection contract host data implements, the [`ObjectRef`] handles
//! that address host objects without copying them, and the conversions in
//! both directions between host types and values.

#![warn(missing_docs)]

pub mod containers;
pub mod object;
pub mod record;
pub mod reflect;
pub mod type_coercion;
pub mod value;

pub use containers::{MAP_TYPE_NAME, MapKey, SEQUENCE_TYPE_NAME};
pub use object::ObjectRef;
pub use record::{MethodResult, Record, RecordBuilder, RecordType};
pub use reflect::{Member, MethodSignature, ObjectKind, ParamKind, Reflect, ToValue};
pub use type_coercion::{
    ConversionError, ConversionResult, FromValue, to_float, to_integer, to_truth,
};
pub use value::Value;
