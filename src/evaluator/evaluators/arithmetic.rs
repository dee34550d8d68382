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

//! Arithmetic, bitwise and unary operations evaluator

use crate::ast::{BinaryOperator, UnaryOperator};
use crate::evaluator::error::{EvaluationError, EvaluationResult};
use crate::model::{Value, to_float, to_integer, to_truth};

/// Specialized evaluator for arithmetic operations
pub struct ArithmeticEvaluator;

impl ArithmeticEvaluator {
    /// Evaluate `+ - * / %`
    ///
    /// A string on the left of `+` concatenates the right operand's textual
    /// form. Otherwise two integers stay integral (wrapping on overflow) and
    /// anything else with a float view is computed in floating point.
    pub fn evaluate(op: BinaryOperator, left: &Value, right: &Value) -> EvaluationResult<Value> {
        if op == BinaryOperator::Add {
            if let Value::String(s) = left {
                return Ok(Value::String(format!("{s}{right}")));
            }
        }

        if let (Some(l), Some(r)) = (to_integer(left), to_integer(right)) {
            return Self::integer(op, l, r);
        }

        match (to_float(left), to_float(right)) {
            (Some(l), Some(r)) => Self::float(op, l, r),
            _ => Err(EvaluationError::InvalidArithmetic {
                op: op.symbol().to_string(),
                left: left.type_name().to_string(),
                right: right.type_name().to_string(),
            }),
        }
    }

    fn integer(op: BinaryOperator, l: i64, r: i64) -> EvaluationResult<Value> {
        let result = match op {
            BinaryOperator::Add => l.wrapping_add(r),
            BinaryOperator::Subtract => l.wrapping_sub(r),
            BinaryOperator::Multiply => l.wrapping_mul(r),
            BinaryOperator::Divide | BinaryOperator::Modulo if r == 0 => {
                return Err(EvaluationError::DivisionByZero);
            }
            BinaryOperator::Divide => l.wrapping_div(r),
            BinaryOperator::Modulo => l.wrapping_rem(r),
            _ => return Ok(Value::Nil),
        };
        Ok(Value::Integer(result))
    }

    fn float(op: BinaryOperator, l: f64, r: f64) -> EvaluationResult<Value> {
        let result = match op {
            BinaryOperator::Add => l + r,
            BinaryOperator::Subtract => l - r,
            BinaryOperator::Multiply => l * r,
            BinaryOperator::Divide | BinaryOperator::Modulo if r == 0.0 => {
                return Err(EvaluationError::DivisionByZero);
            }
            BinaryOperator::Divide => l / r,
            // Float modulo is undefined and yields nil
            _ => return Ok(Value::Nil),
        };
        Ok(Value::Float(result))
    }

    /// Evaluate `& | ^ << >>` on integer operands
    ///
    /// Shift counts must be non-negative; counts of 64 or more shift every
    /// bit out.
    pub fn evaluate_bitwise(
        op: BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> EvaluationResult<Value> {
        let (Some(l), Some(r)) = (to_integer(left), to_integer(right)) else {
            return Err(EvaluationError::InvalidBitwise {
                op: op.symbol().to_string(),
                left: left.type_name().to_string(),
                right: right.type_name().to_string(),
            });
        };

        let result = match op {
            BinaryOperator::BitAnd => l & r,
            BinaryOperator::BitOr => l | r,
            BinaryOperator::BitXor => l ^ r,
            BinaryOperator::ShiftLeft | BinaryOperator::ShiftRight if r < 0 => {
                return Err(EvaluationError::NegativeShift { count: r });
            }
            BinaryOperator::ShiftLeft if r >= 64 => 0,
            BinaryOperator::ShiftLeft => l << r,
            BinaryOperator::ShiftRight if r >= 64 => {
                if l < 0 {
                    -1
                } else {
                    0
                }
            }
            BinaryOperator::ShiftRight => l >> r,
            _ => return Ok(Value::Nil),
        };
        Ok(Value::Integer(result))
    }

    /// Evaluate `! - ~`
    pub fn evaluate_unary(op: UnaryOperator, operand: &Value) -> EvaluationResult<Value> {
        match op {
            UnaryOperator::Not => Ok(Value::Boolean(!to_truth(operand))),
            UnaryOperator::Negate => {
                if let Some(i) = to_integer(operand) {
                    Ok(Value::Integer(i.wrapping_neg()))
                } else if let Some(f) = to_float(operand) {
                    Ok(Value::Float(-f))
                } else {
                    Err(Self::invalid_unary(op, operand))
                }
            }
            UnaryOperator::BitNot => to_integer(operand)
                .map(|i| Value::Integer(!i))
                .ok_or_else(|| Self::invalid_unary(op, operand)),
        }
    }

    fn invalid_unary(op: UnaryOperator, operand: &Value) -> EvaluationError {
        EvaluationError::InvalidUnary {
            op: op.symbol().to_string(),
            operand: operand.type_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(BinaryOperator::Add, Value::Integer(10), Value::Integer(5), Value::Integer(15))]
    #[case(BinaryOperator::Divide, Value::Integer(7), Value::Integer(2), Value::Integer(3))]
    #[case(BinaryOperator::Modulo, Value::Integer(-7), Value::Integer(3), Value::Integer(-1))]
    #[case(BinaryOperator::Add, Value::Integer(1), Value::Float(0.5), Value::Float(1.5))]
    #[case(BinaryOperator::Multiply, Value::from("2"), Value::Integer(3), Value::Float(6.0))]
    #[case(BinaryOperator::Add, Value::from("n="), Value::Integer(3), Value::from("n=3"))]
    #[case(BinaryOperator::Add, Value::from("x"), Value::Nil, Value::from("x<nil>"))]
    #[case(BinaryOperator::Modulo, Value::Float(1.5), Value::Float(2.0), Value::Nil)]
    #[case(BinaryOperator::Add, Value::Integer(i64::MAX), Value::Integer(1), Value::Integer(i64::MIN))]
    #[case(BinaryOperator::Divide, Value::Integer(i64::MIN), Value::Integer(-1), Value::Integer(i64::MIN))]
    fn test_arithmetic(
        #[case] op: BinaryOperator,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(ArithmeticEvaluator::evaluate(op, &left, &right), Ok(expected));
    }

    #[rstest]
    #[case(Value::Integer(0))]
    #[case(Value::Float(0.0))]
    fn test_division_by_zero(#[case] zero: Value) {
        for op in [BinaryOperator::Divide, BinaryOperator::Modulo] {
            assert_eq!(
                ArithmeticEvaluator::evaluate(op, &Value::Float(1.5), &zero),
                Err(EvaluationError::DivisionByZero)
            );
        }
        assert_eq!(
            ArithmeticEvaluator::evaluate(BinaryOperator::Divide, &Value::Integer(1), &Value::Integer(0)),
            Err(EvaluationError::DivisionByZero)
        );
    }

    #[test]
    fn test_non_numeric_operands() {
        let err = ArithmeticEvaluator::evaluate(
            BinaryOperator::Add,
            &Value::Integer(10),
            &Value::from("res"),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid arithmetic + between int64 and string");
    }

    #[rstest]
    #[case(BinaryOperator::BitAnd, 12, 10, 8)]
    #[case(BinaryOperator::BitOr, 12, 10, 14)]
    #[case(BinaryOperator::BitXor, 12, 10, 6)]
    #[case(BinaryOperator::ShiftLeft, 1, 4, 16)]
    #[case(BinaryOperator::ShiftRight, -16, 2, -4)]
    #[case(BinaryOperator::ShiftLeft, 1, 64, 0)]
    #[case(BinaryOperator::ShiftRight, -5, 100, -1)]
    #[case(BinaryOperator::ShiftRight, 5, 100, 0)]
    fn test_bitwise(#[case] op: BinaryOperator, #[case] l: i64, #[case] r: i64, #[case] expected: i64) {
        assert_eq!(
            ArithmeticEvaluator::evaluate_bitwise(op, &Value::Integer(l), &Value::Integer(r)),
            Ok(Value::Integer(expected))
        );
    }

    #[test]
    fn test_bitwise_errors() {
        assert_eq!(
            ArithmeticEvaluator::evaluate_bitwise(
                BinaryOperator::ShiftLeft,
                &Value::Integer(1),
                &Value::Integer(-1)
            ),
            Err(EvaluationError::NegativeShift { count: -1 })
        );
        assert!(matches!(
            ArithmeticEvaluator::evaluate_bitwise(
                BinaryOperator::BitAnd,
                &Value::Float(1.0),
                &Value::Integer(1)
            ),
            Err(EvaluationError::InvalidBitwise { .. })
        ));
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            ArithmeticEvaluator::evaluate_unary(UnaryOperator::Not, &Value::from("")),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            ArithmeticEvaluator::evaluate_unary(UnaryOperator::Negate, &Value::from("2.5")),
            Ok(Value::Float(-2.5))
        );
        assert_eq!(
            ArithmeticEvaluator::evaluate_unary(UnaryOperator::BitNot, &Value::Integer(0)),
            Ok(Value::Integer(-1))
        );
        let err = ArithmeticEvaluator::evaluate_unary(UnaryOperator::BitNot, &Value::Float(1.0))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid unary ~ for float64");
    }
}
