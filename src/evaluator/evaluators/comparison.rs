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

//! Comparison and equality operations evaluator

use crate::ast::BinaryOperator;
use crate::evaluator::error::{EvaluationError, EvaluationResult};
use crate::model::{Value, to_float};

/// Specialized evaluator for comparison operations
pub struct ComparisonEvaluator;

impl ComparisonEvaluator {
    /// Evaluate `< > <= >=` on operands with a float view
    pub fn evaluate_relational(
        op: BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> EvaluationResult<Value> {
        let (Some(l), Some(r)) = (to_float(left), to_float(right)) else {
            return Err(EvaluationError::InvalidComparison {
                left: left.type_name().to_string(),
                right: right.type_name().to_string(),
            });
        };

        let result = match op {
            BinaryOperator::LessThan => l < r,
            BinaryOperator::GreaterThan => l > r,
            BinaryOperator::LessThanOrEqual => l <= r,
            BinaryOperator::GreaterThanOrEqual => l >= r,
            _ => false,
        };
        Ok(Value::Boolean(result))
    }

    /// Evaluate `==` and `!=`
    pub fn evaluate_equality(op: BinaryOperator, left: &Value, right: &Value) -> Value {
        let equal = Self::equals(left, right);
        Value::Boolean(if op == BinaryOperator::NotEqual {
            !equal
        } else {
            equal
        })
    }

    /// Deep structural equality, falling back to numeric comparison
    ///
    /// `1 == 1.0` and `"2" == 2` hold because both sides have a float view.
    pub fn equals(left: &Value, right: &Value) -> bool {
        if left == right {
            return true;
        }
        match (to_float(left), to_float(right)) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        }
    }
}
