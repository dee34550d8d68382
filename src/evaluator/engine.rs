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

//! Tree-walking evaluator

use super::context::EvaluationContext;
use super::error::{EvaluationError, EvaluationResult};
use super::evaluators::{
    ArithmeticEvaluator, ComparisonEvaluator, LEN_METHOD, NavigationEvaluator,
};
use super::fault;
use crate::ast::{
    Arguments, BinaryOpData, BinaryOperator, ConditionalData, ExpressionNode, FunctionCallData,
    LiteralValue, MethodCallData,
};
use crate::model::{Value, to_truth};
use crate::stack::ensure_sufficient_stack;
use std::sync::Arc;

/// Evaluates an AST against one [`EvaluationContext`]
///
/// The tree is only borrowed; the same AST can be evaluated any number of
/// times, concurrently, against different contexts.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionEvaluator<'ctx> {
    context: &'ctx EvaluationContext,
}

impl<'ctx> ExpressionEvaluator<'ctx> {
    /// Create an evaluator bound to a context
    pub fn new(context: &'ctx EvaluationContext) -> Self {
        Self { context }
    }

    /// Evaluate an expression node
    pub fn evaluate(&self, node: &ExpressionNode) -> EvaluationResult<Value> {
        ensure_sufficient_stack(|| self.evaluate_node(node))
    }

    fn evaluate_node(&self, node: &ExpressionNode) -> EvaluationResult<Value> {
        match node {
            ExpressionNode::Literal(literal) => Ok(literal_value(literal)),

            ExpressionNode::Variable(name) => {
                Ok(NavigationEvaluator::member(&self.context.root, name))
            }

            ExpressionNode::MemberAccess { base, member, .. } => {
                let receiver = self.evaluate(base)?;
                Ok(NavigationEvaluator::member(&receiver, member))
            }

            ExpressionNode::Index { base, index } => {
                let receiver = self.evaluate(base)?;
                if receiver.is_nil() {
                    return Ok(Value::Nil);
                }
                let key = self.evaluate(index)?;
                Ok(NavigationEvaluator::index(&receiver, &key))
            }

            ExpressionNode::MethodCall(data) => self.evaluate_method_call(data),

            ExpressionNode::FunctionCall(data) => self.evaluate_function_call(data),

            ExpressionNode::UnaryOp { op, operand } => {
                let value = self.evaluate(operand)?;
                ArithmeticEvaluator::evaluate_unary(*op, &value)
            }

            ExpressionNode::BinaryOp(data) => self.evaluate_binary_op(data),

            ExpressionNode::Conditional(data) => self.evaluate_conditional(data),
        }
    }

    fn evaluate_arguments(&self, args: &Arguments) -> EvaluationResult<Vec<Value>> {
        args.iter().map(|arg| self.evaluate(arg)).collect()
    }

    fn evaluate_method_call(&self, data: &MethodCallData) -> EvaluationResult<Value> {
        let receiver = self.evaluate(&data.base)?;

        if data.method == LEN_METHOD && data.args.is_empty() {
            if let Some(count) = NavigationEvaluator::builtin_len(&receiver) {
                return Ok(count);
            }
        }
        if receiver.is_nil() {
            return Ok(Value::Nil);
        }

        let args = self.evaluate_arguments(&data.args)?;
        NavigationEvaluator::invoke_method(&receiver, &data.method, args)
    }

    /// Registered function first, then a method on the root data
    fn evaluate_function_call(&self, data: &FunctionCallData) -> EvaluationResult<Value> {
        if let Some(function) = self.context.function(&data.name) {
            let function = Arc::clone(function);
            let args = self.evaluate_arguments(&data.args)?;
            return fault::contain(&data.name, || {
                function(args.as_slice())
                    .map_err(|error| EvaluationError::function(&data.name, &error))
            });
        }

        if self.context.has_root() {
            let args = self.evaluate_arguments(&data.args)?;
            match NavigationEvaluator::invoke_method(&self.context.root, &data.name, args) {
                Err(error) if error.is_method_not_found() => {}
                result => return result,
            }
        }

        Err(EvaluationError::FunctionNotFound {
            name: data.name.clone(),
        })
    }

    fn evaluate_binary_op(&self, data: &BinaryOpData) -> EvaluationResult<Value> {
        let left = self.evaluate(&data.left)?;

        // Short-circuit: the right side is neither evaluated nor checked
        match data.op {
            BinaryOperator::And if !to_truth(&left) => return Ok(Value::Boolean(false)),
            BinaryOperator::Or if to_truth(&left) => return Ok(Value::Boolean(true)),
            BinaryOperator::And | BinaryOperator::Or => {
                let right = self.evaluate(&data.right)?;
                return Ok(Value::Boolean(to_truth(&right)));
            }
            _ => {}
        }

        let right = self.evaluate(&data.right)?;
        match data.op {
            op if op.is_arithmetic() => ArithmeticEvaluator::evaluate(op, &left, &right),
            op if op.is_bitwise() => ArithmeticEvaluator::evaluate_bitwise(op, &left, &right),
            op if op.is_comparison() => {
                ComparisonEvaluator::evaluate_relational(op, &left, &right)
            }
            op => Ok(ComparisonEvaluator::evaluate_equality(op, &left, &right)),
        }
    }

    fn evaluate_conditional(&self, data: &ConditionalData) -> EvaluationResult<Value> {
        let condition = self.evaluate(&data.condition)?;
        if to_truth(&condition) {
            self.evaluate(&data.then_expr)
        } else {
            self.evaluate(&data.else_expr)
        }
    }
}

/// Runtime value of a literal node
pub fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Boolean(b) => Value::Boolean(*b),
        LiteralValue::Integer(i) => Value::Integer(*i),
        LiteralValue::Float(f) => Value::Float(*f),
        LiteralValue::String(s) => Value::String(s.clone()),
    }
}
