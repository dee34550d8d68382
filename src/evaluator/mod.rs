//! Expression evaluator
//!
//! Walks an AST against root data and a function snapshot. Operators are
//! delegated to the specialized evaluators in [`evaluators`]; host code runs
//! behind the [`fault`] barrier.

#![warn(missing_docs)]

mod context;
mod engine;
mod error;
pub mod evaluators;
pub mod fault;

pub use context::EvaluationContext;
pub use engine::{ExpressionEvaluator, literal_value};
pub use error::{EvaluationError, EvaluationResult};
