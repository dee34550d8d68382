// Error types for expression evaluation

use thiserror::Error;

/// Result type for evaluation operations
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors that can occur while evaluating an expression
///
/// Missing members, keys and out-of-range indexes are not errors; they
/// resolve to nil. Only invalid operator usage, missing callables and
/// failing host code end up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// Integer or float division (or modulo) by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Shift with a negative count
    #[error("negative shift count {count}")]
    NegativeShift {
        /// Offending shift count
        count: i64,
    },

    /// Relational operator on operands without a numeric view
    #[error("invalid comparison between {left} and {right}")]
    InvalidComparison {
        /// Left operand type
        left: String,
        /// Right operand type
        right: String,
    },

    /// Arithmetic operator on operands without a numeric view
    #[error("invalid arithmetic {op} between {left} and {right}")]
    InvalidArithmetic {
        /// Operator symbol
        op: String,
        /// Left operand type
        left: String,
        /// Right operand type
        right: String,
    },

    /// Bitwise operator on non-integer operands
    #[error("invalid bitwise op {op} between {left} and {right}")]
    InvalidBitwise {
        /// Operator symbol
        op: String,
        /// Left operand type
        left: String,
        /// Right operand type
        right: String,
    },

    /// Unary operator applied to an unsupported operand
    #[error("invalid unary {op} for {operand}")]
    InvalidUnary {
        /// Operator symbol
        op: String,
        /// Operand type
        operand: String,
    },

    /// Neither a registered function nor a method on the root data
    #[error("function or method {name} not found")]
    FunctionNotFound {
        /// Called name as written
        name: String,
    },

    /// Receiver has no method with this name
    #[error("method {method} not found on {type_name}")]
    MethodNotFound {
        /// Method name
        method: String,
        /// Receiver type
        type_name: String,
    },

    /// Wrong number of call arguments
    #[error(
        "{method}: expected {}{expected} args, got {actual}",
        if *variadic { "at least " } else { "" }
    )]
    ArityMismatch {
        /// Method name
        method: String,
        /// Required (minimum, when variadic) argument count
        expected: usize,
        /// Supplied argument count
        actual: usize,
        /// Whether extra trailing arguments are accepted
        variadic: bool,
    },

    /// Call argument not convertible to the declared parameter kind
    #[error("method {method} arg {index}: cannot use {actual} as {expected}")]
    ArgumentConversion {
        /// Method name
        method: String,
        /// Zero-based argument position
        index: usize,
        /// Supplied argument type
        actual: String,
        /// Declared parameter kind
        expected: String,
    },

    /// A registered function returned an error
    #[error("{name}: {message}")]
    Function {
        /// Function name as called
        name: String,
        /// Host error message
        message: String,
    },

    /// A host method returned an error
    #[error("{method}: {message}")]
    MethodFailed {
        /// Method name
        method: String,
        /// Host error message
        message: String,
    },

    /// Host code panicked and the fault barrier caught it
    #[error("panic calling {context}: {message}")]
    Panic {
        /// Method, function or expression being evaluated
        context: String,
        /// Panic payload text
        message: String,
    },
}

impl EvaluationError {
    /// Build an [`EvaluationError::Function`] from a host error
    pub fn function(name: impl Into<String>, error: &anyhow::Error) -> Self {
        Self::Function {
            name: name.into(),
            message: format!("{error:#}"),
        }
    }

    /// Build an [`EvaluationError::MethodFailed`] from a host error
    pub fn method_failed(method: impl Into<String>, error: &anyhow::Error) -> Self {
        Self::MethodFailed {
            method: method.into(),
            message: format!("{error:#}"),
        }
    }

    /// Whether this error reports a missing method
    pub fn is_method_not_found(&self) -> bool {
        matches!(self, Self::MethodNotFound { .. })
    }
}
