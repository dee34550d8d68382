//! Specialized evaluators for each kind of operation

pub mod arithmetic;
pub mod comparison;
pub mod navigation;

pub use arithmetic::ArithmeticEvaluator;
pub use comparison::ComparisonEvaluator;
pub use navigation::{LEN_METHOD, NavigationEvaluator};
