//! Abstract Syntax Tree (AST) definitions for expressions
//!
//! The node set is closed; every node renders a canonical textual form via
//! `Display` that re-parses to an equivalent tree.

mod expression;
mod operator;

pub use expression::*;
pub use operator::*;
