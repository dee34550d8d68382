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

//! Error types for the engine
//!
//! Every layer owns its own error enum; [`OkraError`] wraps them so the
//! engine returns a single type.

use crate::evaluator::EvaluationError;
use crate::model::ConversionError;
use crate::parser::ParseError;
use crate::registry::RegistryError;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, OkraError>;

/// Any error the engine can return
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OkraError {
    /// Expression text is not valid syntax
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Evaluation failed
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Function registration was rejected
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The result does not convert to the requested type
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl OkraError {
    /// Whether this is a syntax error
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Whether host code panicked during evaluation
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Evaluation(EvaluationError::Panic { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_messages_are_transparent() {
        let error = OkraError::from(EvaluationError::DivisionByZero);
        assert_eq!(error.to_string(), "division by zero");
        assert!(!error.is_parse_error());

        let error = OkraError::from(ParseError::UnexpectedEof);
        assert!(error.is_parse_error());
    }
}
