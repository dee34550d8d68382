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

// Evaluation context for expressions

use crate::model::Value;
use crate::registry::{CustomFunction, FunctionSnapshot};
use std::sync::Arc;

/// Everything one evaluation reads: the root data and a function snapshot
///
/// The snapshot is taken once per call, so registrations that race with an
/// evaluation are either fully visible or not at all.
#[derive(Clone, Debug)]
pub struct EvaluationContext {
    /// Root data value that bare identifiers resolve against
    pub root: Value,
    /// Functions callable by name
    pub functions: Arc<FunctionSnapshot>,
}

impl EvaluationContext {
    /// Create a new evaluation context
    pub fn new(root: Value, functions: Arc<FunctionSnapshot>) -> Self {
        Self { root, functions }
    }

    /// Look up a callable function, ignoring case
    pub fn function(&self, name: &str) -> Option<&CustomFunction> {
        self.functions.get(name)
    }

    /// Whether there is root data to fall back on
    pub fn has_root(&self) -> bool {
        !self.root.is_nil()
    }
}
