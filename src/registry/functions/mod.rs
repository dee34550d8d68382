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

//! Built-in functions available to every engine

pub mod collection;
pub mod datetime;

use super::function::FunctionSnapshot;
use std::sync::Arc;

/// Register all built-in functions
pub fn register_builtin_functions(snapshot: &mut FunctionSnapshot) {
    snapshot.insert("len", Arc::new(collection::len));
    snapshot.insert("now", Arc::new(datetime::now));
}
