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

//! Member, index and method resolution against host values

use crate::evaluator::error::{EvaluationError, EvaluationResult};
use crate::evaluator::fault;
use crate::model::{ObjectKind, Value};

/// Name of the pseudo-method answered without consulting the receiver
pub const LEN_METHOD: &str = "len";

/// Specialized evaluator for navigation operations
pub struct NavigationEvaluator;

impl NavigationEvaluator {
    /// Resolve `receiver.name`; anything unresolvable is nil
    ///
    /// Objects reached this way share the receiver's host data.
    pub fn member(receiver: &Value, name: &str) -> Value {
        receiver.member(name).unwrap_or_default()
    }

    /// Resolve `receiver[key]`; anything unresolvable is nil
    pub fn index(receiver: &Value, key: &Value) -> Value {
        receiver.index(key).unwrap_or_default()
    }

    /// Count answered by the zero-argument `len()` pseudo-method
    ///
    /// Strings count characters, maps and sequences count entries, nil is 0.
    /// Other receivers return `None` and the call goes to the receiver.
    pub fn builtin_len(receiver: &Value) -> Option<Value> {
        let count = match receiver {
            Value::Nil => 0,
            Value::String(s) => s.chars().count(),
            Value::Object(_) if receiver.object_kind() != Some(ObjectKind::Record) => {
                receiver.as_object()?.len()?
            }
            _ => return None,
        };
        Some(Value::Integer(count as i64))
    }

    /// Invoke a host method with already evaluated arguments
    ///
    /// The argument count is checked against the signature (a minimum for
    /// variadic methods) and each argument is converted to its declared
    /// kind before the call. Host panics are contained.
    pub fn invoke_method(receiver: &Value, method: &str, args: Vec<Value>) -> EvaluationResult<Value> {
        let not_found = || EvaluationError::MethodNotFound {
            method: method.to_string(),
            type_name: receiver.type_name().to_string(),
        };
        let Some(object) = receiver.as_object() else {
            return Err(not_found());
        };
        let signature = object.method(method).ok_or_else(not_found)?;

        let arity = signature.arity();
        let arity_ok = if signature.is_variadic() {
            args.len() >= arity
        } else {
            args.len() == arity
        };
        if !arity_ok {
            return Err(EvaluationError::ArityMismatch {
                method: method.to_string(),
                expected: arity,
                actual: args.len(),
                variadic: signature.is_variadic(),
            });
        }

        let mut converted = Vec::with_capacity(args.len());
        for (index, arg) in args.into_iter().enumerate() {
            let Some(kind) = signature.param_kind(index) else {
                return Err(not_found());
            };
            let actual = arg.type_name().to_string();
            match kind.convert(arg) {
                Some(value) => converted.push(value),
                None => {
                    return Err(EvaluationError::ArgumentConversion {
                        method: method.to_string(),
                        index,
                        actual,
                        expected: kind.to_string(),
                    });
                }
            }
        }

        fault::contain(method, || {
            object
                .invoke(method, converted)
                .map_err(|error| EvaluationError::method_failed(method, &error))
        })
    }
}
