//! Operator definitions for expressions
//!
//! Binary and unary operators together with their binding powers.

use std::fmt;

/// Binary (infix) operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic operators
    /// Addition or string concatenation (+)
    Add,
    /// Subtraction (-)
    Subtract,
    /// Multiplication (*)
    Multiply,
    /// Division (/)
    Divide,
    /// Integer remainder (%)
    Modulo,

    // Bitwise operators
    /// Left shift (<<)
    ShiftLeft,
    /// Right shift (>>)
    ShiftRight,
    /// Bitwise AND (&)
    BitAnd,
    /// Bitwise OR (|)
    BitOr,
    /// Bitwise XOR (^)
    BitXor,

    // Comparison operators
    /// Less than (<)
    LessThan,
    /// Greater than (>)
    GreaterThan,
    /// Less than or equal (<=)
    LessThanOrEqual,
    /// Greater than or equal (>=)
    GreaterThanOrEqual,
    /// Equality (==)
    Equal,
    /// Inequality (!=)
    NotEqual,

    // Logical operators
    /// Short-circuit AND (&&)
    And,
    /// Short-circuit OR (||)
    Or,
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Logical negation (!)
    Not,
    /// Arithmetic negation (-)
    Negate,
    /// Bitwise complement (~)
    BitNot,
}

impl BinaryOperator {
    /// Binding power of this operator (higher = binds tighter)
    pub fn precedence(self) -> u8 {
        match self {
            Self::Multiply
            | Self::Divide
            | Self::Modulo
            | Self::ShiftLeft
            | Self::ShiftRight
            | Self::BitAnd => 50,

            Self::Add | Self::Subtract | Self::BitOr | Self::BitXor => 40,

            Self::LessThan
            | Self::GreaterThan
            | Self::LessThanOrEqual
            | Self::GreaterThanOrEqual => 35,

            Self::Equal | Self::NotEqual => 30,

            Self::And => 20,

            Self::Or => 10,
        }
    }

    /// Check if this operator is arithmetic
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide | Self::Modulo
        )
    }

    /// Check if this operator is bitwise
    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            Self::ShiftLeft | Self::ShiftRight | Self::BitAnd | Self::BitOr | Self::BitXor
        )
    }

    /// Check if this operator is an ordering comparison
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::LessThan | Self::GreaterThan | Self::LessThanOrEqual | Self::GreaterThanOrEqual
        )
    }

    /// Get the symbol representation of this operator
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThanOrEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

impl UnaryOperator {
    /// Binding power applied to the operand of a prefix operator
    pub const PRECEDENCE: u8 = 60;

    /// Get the symbol representation of this operator
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Negate => "-",
            Self::BitNot => "~",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_powers_are_ordered() {
        assert!(BinaryOperator::Multiply.precedence() > BinaryOperator::Add.precedence());
        assert!(BinaryOperator::Add.precedence() > BinaryOperator::LessThan.precedence());
        assert!(BinaryOperator::LessThan.precedence() > BinaryOperator::Equal.precedence());
        assert!(BinaryOperator::Equal.precedence() > BinaryOperator::And.precedence());
        assert!(BinaryOperator::And.precedence() > BinaryOperator::Or.precedence());
        assert!(UnaryOperator::PRECEDENCE > BinaryOperator::ShiftLeft.precedence());
    }

    #[test]
    fn test_symbols() {
        assert_eq!(BinaryOperator::BitXor.to_string(), "^");
        assert_eq!(UnaryOperator::BitNot.to_string(), "~");
        assert!(BinaryOperator::ShiftRight.is_bitwise());
        assert!(!BinaryOperator::Modulo.is_bitwise());
    }
}
