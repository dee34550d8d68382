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

//! Expression AST node definitions

use super::operator::{BinaryOperator, UnaryOperator};
use crate::parser::tokenizer::is_identifier;
use crate::stack::ensure_sufficient_stack;
use smallvec::SmallVec;
use std::fmt::{self, Write as _};

/// Argument list (SmallVec for the common case of 0-4 args)
pub type Arguments = SmallVec<[ExpressionNode; 4]>;

/// AST representation of an expression
///
/// A pure tree: every node owns its children and nodes are immutable once
/// built. Large variants are boxed to keep the enum small. Cloning,
/// comparing, formatting and dropping are safe on arbitrarily deep trees.
pub enum ExpressionNode {
    /// Literal value (boolean, integer, float, string)
    Literal(LiteralValue),

    /// Name resolved against the root data value
    Variable(String),

    /// Member access (`receiver.key`)
    MemberAccess {
        /// Receiver expression
        base: Box<ExpressionNode>,
        /// Member name
        member: String,
        /// Whether the access was written with bracket syntax
        ///
        /// Informational only: canonical text always uses the dot form, the
        /// one spelling that parses back to a member access.
        is_index: bool,
    },

    /// Index access with an arbitrary key expression (`receiver[expr]`)
    Index {
        /// Receiver expression
        base: Box<ExpressionNode>,
        /// Key expression
        index: Box<ExpressionNode>,
    },

    /// Method call on an expression (boxed for size optimization)
    MethodCall(Box<MethodCallData>),

    /// Free function call (boxed for size optimization)
    FunctionCall(Box<FunctionCallData>),

    /// Prefix operation
    UnaryOp {
        /// The operator
        op: UnaryOperator,
        /// The operand
        operand: Box<ExpressionNode>,
    },

    /// Infix operation (boxed for size optimization)
    BinaryOp(Box<BinaryOpData>),

    /// `cond ? then : else` (boxed for size optimization)
    Conditional(Box<ConditionalData>),
}

/// Binary operation data
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOpData {
    /// The operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: ExpressionNode,
    /// Right operand
    pub right: ExpressionNode,
}

/// Function call data
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallData {
    /// Function name as written
    pub name: String,
    /// Function arguments
    pub args: Arguments,
}

/// Method call data
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCallData {
    /// Receiver expression
    pub base: ExpressionNode,
    /// Method name
    pub method: String,
    /// Method arguments
    pub args: Arguments,
}

/// Conditional expression data
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalData {
    /// Condition
    pub condition: ExpressionNode,
    /// Branch taken when the condition is truthy
    pub then_expr: ExpressionNode,
    /// Branch taken otherwise
    pub else_expr: ExpressionNode,
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Boolean literal
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Float literal
    Float(f64),
    /// String literal
    String(String),
}

impl ExpressionNode {
    /// Create a literal expression
    pub fn literal(value: LiteralValue) -> Self {
        Self::Literal(value)
    }

    /// Create a variable reference
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Create a dot-style member access
    pub fn member(base: ExpressionNode, member: impl Into<String>) -> Self {
        Self::MemberAccess {
            base: Box::new(base),
            member: member.into(),
            is_index: false,
        }
    }

    /// Create a member access written in bracket form
    pub fn member_index(base: ExpressionNode, member: impl Into<String>) -> Self {
        Self::MemberAccess {
            base: Box::new(base),
            member: member.into(),
            is_index: true,
        }
    }

    /// Create an index expression
    pub fn index(base: ExpressionNode, index: ExpressionNode) -> Self {
        Self::Index {
            base: Box::new(base),
            index: Box::new(index),
        }
    }

    /// Create a method call
    pub fn method_call(
        base: ExpressionNode,
        method: impl Into<String>,
        args: impl Into<Arguments>,
    ) -> Self {
        Self::MethodCall(Box::new(MethodCallData {
            base,
            method: method.into(),
            args: args.into(),
        }))
    }

    /// Create a free function call
    pub fn function_call(name: impl Into<String>, args: impl Into<Arguments>) -> Self {
        Self::FunctionCall(Box::new(FunctionCallData {
            name: name.into(),
            args: args.into(),
        }))
    }

    /// Create a unary operation
    pub fn unary_op(op: UnaryOperator, operand: ExpressionNode) -> Self {
        Self::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a binary operation
    pub fn binary_op(op: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        Self::BinaryOp(Box::new(BinaryOpData { op, left, right }))
    }

    /// Create a conditional expression
    pub fn conditional(
        condition: ExpressionNode,
        then_expr: ExpressionNode,
        else_expr: ExpressionNode,
    ) -> Self {
        Self::Conditional(Box::new(ConditionalData {
            condition,
            then_expr,
            else_expr,
        }))
    }

    /// Get literal value if this is a literal expression
    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match self {
            Self::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Get the variable name if this is a variable reference
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// Leaves own no sub-expressions
    fn is_leaf(&self) -> bool {
        match self {
            Self::Literal(_) | Self::Variable(_) => true,
            Self::FunctionCall(data) => data.args.is_empty(),
            _ => false,
        }
    }

    /// Move every non-leaf child into `out`, leaving cheap placeholders behind
    fn detach_children(&mut self, out: &mut Vec<ExpressionNode>) {
        fn detach(node: &mut ExpressionNode, out: &mut Vec<ExpressionNode>) {
            if !node.is_leaf() {
                out.push(std::mem::replace(node, ExpressionNode::PLACEHOLDER));
            }
        }

        match self {
            Self::Literal(_) | Self::Variable(_) => {}
            Self::MemberAccess { base, .. } => detach(base, out),
            Self::Index { base, index } => {
                detach(base, out);
                detach(index, out);
            }
            Self::MethodCall(data) => {
                detach(&mut data.base, out);
                out.extend(data.args.drain(..).filter(|arg| !arg.is_leaf()));
            }
            Self::FunctionCall(data) => {
                out.extend(data.args.drain(..).filter(|arg| !arg.is_leaf()));
            }
            Self::UnaryOp { operand, .. } => detach(operand, out),
            Self::BinaryOp(data) => {
                detach(&mut data.left, out);
                detach(&mut data.right, out);
            }
            Self::Conditional(data) => {
                detach(&mut data.condition, out);
                detach(&mut data.then_expr, out);
                detach(&mut data.else_expr, out);
            }
        }
    }

    const PLACEHOLDER: ExpressionNode = ExpressionNode::Literal(LiteralValue::Boolean(false));
}

/// Trees are torn down iteratively so very deep chains cannot exhaust the stack
impl Drop for ExpressionNode {
    fn drop(&mut self) {
        if self.is_leaf() {
            return;
        }
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

/// Quote a string with double quotes, escaping anything the tokenizer decodes
pub fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{07}' => quoted.push_str("\\a"),
            '\u{08}' => quoted.push_str("\\b"),
            '\u{0C}' => quoted.push_str("\\f"),
            '\u{0B}' => quoted.push_str("\\v"),
            c if c.is_ascii_control() => {
                let _ = write!(quoted, "\\x{:02x}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{:04x}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Render a float so that it re-tokenizes as a float
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::String(s) => f.write_str(&quote_string(s)),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &Arguments) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

/// Member and method names print bare only when they lex back as one
/// identifier; anything else (`content-type`, `1x`, `1`) is quoted.
fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_identifier(name) {
        f.write_str(name)
    } else {
        f.write_str(&quote_string(name))
    }
}

impl Clone for ExpressionNode {
    fn clone(&self) -> Self {
        ensure_sufficient_stack(|| match self {
            Self::Literal(value) => Self::Literal(value.clone()),
            Self::Variable(name) => Self::Variable(name.clone()),
            Self::MemberAccess {
                base,
                member,
                is_index,
            } => Self::MemberAccess {
                base: base.clone(),
                member: member.clone(),
                is_index: *is_index,
            },
            Self::Index { base, index } => Self::Index {
                base: base.clone(),
                index: index.clone(),
            },
            Self::MethodCall(data) => Self::MethodCall(data.clone()),
            Self::FunctionCall(data) => Self::FunctionCall(data.clone()),
            Self::UnaryOp { op, operand } => Self::UnaryOp {
                op: *op,
                operand: operand.clone(),
            },
            Self::BinaryOp(data) => Self::BinaryOp(data.clone()),
            Self::Conditional(data) => Self::Conditional(data.clone()),
        })
    }
}

impl PartialEq for ExpressionNode {
    fn eq(&self, other: &Self) -> bool {
        ensure_sufficient_stack(|| match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Variable(a), Self::Variable(b)) => a == b,
            (
                Self::MemberAccess {
                    base: a,
                    member: a_member,
                    is_index: a_index,
                },
                Self::MemberAccess {
                    base: b,
                    member: b_member,
                    is_index: b_index,
                },
            ) => a_member == b_member && a_index == b_index && a == b,
            (
                Self::Index {
                    base: a,
                    index: a_index,
                },
                Self::Index {
                    base: b,
                    index: b_index,
                },
            ) => a_index == b_index && a == b,
            (Self::MethodCall(a), Self::MethodCall(b)) => a == b,
            (Self::FunctionCall(a), Self::FunctionCall(b)) => a == b,
            (
                Self::UnaryOp {
                    op: a_op,
                    operand: a,
                },
                Self::UnaryOp {
                    op: b_op,
                    operand: b,
                },
            ) => a_op == b_op && a == b,
            (Self::BinaryOp(a), Self::BinaryOp(b)) => a == b,
            (Self::Conditional(a), Self::Conditional(b)) => a == b,
            _ => false,
        })
    }
}

impl fmt::Debug for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Variable(name) => f.debug_tuple("Variable").field(name).finish(),
            Self::MemberAccess {
                base,
                member,
                is_index,
            } => f
                .debug_struct("MemberAccess")
                .field("base", base)
                .field("member", member)
                .field("is_index", is_index)
                .finish(),
            Self::Index { base, index } => f
                .debug_struct("Index")
                .field("base", base)
                .field("index", index)
                .finish(),
            Self::MethodCall(data) => f.debug_tuple("MethodCall").field(data).finish(),
            Self::FunctionCall(data) => f.debug_tuple("FunctionCall").field(data).finish(),
            Self::UnaryOp { op, operand } => f
                .debug_struct("UnaryOp")
                .field("op", op)
                .field("operand", operand)
                .finish(),
            Self::BinaryOp(data) => f.debug_tuple("BinaryOp").field(data).finish(),
            Self::Conditional(data) => f.debug_tuple("Conditional").field(data).finish(),
        })
    }
}

/// Canonical textual form: infix, unary and ternary nodes are fully
/// parenthesized so the output re-parses to an equivalent tree.
impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Variable(name) => f.write_str(name),
            Self::MemberAccess { base, member, .. } => {
                write!(f, "{base}.")?;
                write_name(f, member)
            }
            Self::Index { base, index } => write!(f, "{base}[{index}]"),
            Self::MethodCall(data) => {
                write!(f, "{}.", data.base)?;
                write_name(f, &data.method)?;
                f.write_str("(")?;
                write_args(f, &data.args)?;
                f.write_str(")")
            }
            Self::FunctionCall(data) => {
                write!(f, "{}(", data.name)?;
                write_args(f, &data.args)?;
                f.write_str(")")
            }
            Self::UnaryOp { op, operand } => write!(f, "({op}{operand})"),
            Self::BinaryOp(data) => write!(f, "({} {} {})", data.left, data.op, data.right),
            Self::Conditional(data) => write!(
                f,
                "({} ? {} : {})",
                data.condition, data.then_expr, data.else_expr
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use smallvec::smallvec;

    #[test]
    fn test_canonical_forms() {
        let sum = ExpressionNode::binary_op(
            BinaryOperator::Add,
            ExpressionNode::variable("a"),
            ExpressionNode::literal(LiteralValue::Integer(1)),
        );
        assert_eq!(sum.to_string(), "(a + 1)");

        let negated = ExpressionNode::unary_op(UnaryOperator::Not, ExpressionNode::variable("ok"));
        assert_eq!(negated.to_string(), "(!ok)");

        let ternary = ExpressionNode::conditional(
            ExpressionNode::variable("c"),
            ExpressionNode::literal(LiteralValue::String("yes".into())),
            ExpressionNode::literal(LiteralValue::Float(2.5)),
        );
        assert_eq!(ternary.to_string(), r#"(c ? "yes" : 2.5)"#);
    }

    #[test]
    fn test_calls_and_access() {
        let call = ExpressionNode::function_call(
            "max",
            smallvec![
                ExpressionNode::literal(LiteralValue::Integer(1)),
                ExpressionNode::variable("b"),
            ] as Arguments,
        );
        assert_eq!(call.to_string(), "max(1, b)");

        let method = ExpressionNode::method_call(
            ExpressionNode::member(ExpressionNode::variable("user"), "name"),
            "len",
            Arguments::new(),
        );
        assert_eq!(method.to_string(), "user.name.len()");

        let bracket = ExpressionNode::member_index(ExpressionNode::variable("a"), "0");
        assert_eq!(bracket.to_string(), r#"a."0""#);

        let index = ExpressionNode::index(
            ExpressionNode::variable("m"),
            ExpressionNode::literal(LiteralValue::String("k".into())),
        );
        assert_eq!(index.to_string(), r#"m["k"]"#);
    }

    #[test]
    fn test_literal_rendering() {
        assert_eq!(LiteralValue::Float(13.0).to_string(), "13.0");
        assert_eq!(LiteralValue::Float(0.25).to_string(), "0.25");
        assert_eq!(LiteralValue::Boolean(true).to_string(), "true");
        assert_eq!(
            LiteralValue::String("say \"hi\"\n".into()).to_string(),
            r#""say \"hi\"\n""#
        );
        assert_eq!(quote_string("\u{1}"), r#""\x01""#);
    }

    #[test]
    fn test_deep_tree_drops_without_overflow() {
        let mut node = ExpressionNode::literal(LiteralValue::Integer(0));
        for i in 0..200_000 {
            node = ExpressionNode::binary_op(
                BinaryOperator::Add,
                node,
                ExpressionNode::literal(LiteralValue::Integer(i)),
            );
        }
        drop(node);
    }

    #[rstest]
    #[case("name", "a.name")]
    #[case("_private", "a._private")]
    #[case("true", "a.true")]
    #[case("naïve", "a.naïve")]
    #[case("content-type", r#"a."content-type""#)]
    #[case("1x", r#"a."1x""#)]
    #[case("1", r#"a."1""#)]
    #[case("", r#"a."""#)]
    #[case("with space", r#"a."with space""#)]
    fn test_member_names_quote_when_needed(#[case] name: &str, #[case] expected: &str) {
        let member = ExpressionNode::member(ExpressionNode::variable("a"), name);
        assert_eq!(member.to_string(), expected);

        let call = ExpressionNode::method_call(ExpressionNode::variable("a"), name, Arguments::new());
        assert_eq!(call.to_string(), format!("{expected}()"));
    }

    fn deep_chain(depth: i64) -> ExpressionNode {
        let mut node = ExpressionNode::variable("x");
        for i in 0..depth {
            node = ExpressionNode::binary_op(
                BinaryOperator::Add,
                ExpressionNode::unary_op(UnaryOperator::Negate, node),
                ExpressionNode::literal(LiteralValue::Integer(i)),
            );
        }
        node
    }

    #[test]
    fn test_deep_tree_clones_and_compares_without_overflow() {
        let tree = deep_chain(100_000);
        let copy = tree.clone();
        assert!(copy == tree);
        assert!(copy != deep_chain(99_999));

        let debug = format!("{copy:?}");
        assert!(debug.starts_with("BinaryOp(BinaryOpData { op: Add, left: UnaryOp"));
        assert!(debug.contains("Variable(\"x\")"));
    }
}
