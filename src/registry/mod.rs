//! Function registry
//!
//! Each engine owns a [`FunctionRegistry`] whose table is replaced, never
//! edited, on registration. Evaluations work against an immutable
//! [`FunctionSnapshot`].

#![warn(missing_docs)]

pub mod function;
pub mod functions;

pub use function::{
    CustomFunction, FunctionRegistry, FunctionSnapshot, RegistryError, RegistryResult,
};
