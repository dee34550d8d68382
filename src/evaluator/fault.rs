//! Fault barrier around host code
//!
//! Registered functions and record methods are arbitrary host code. A panic
//! inside them is caught here and surfaced as [`EvaluationError::Panic`] so
//! that no input can bring down the embedding process.

use super::error::{EvaluationError, EvaluationResult};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Run `f`, converting a panic into an error tagged with `context`
pub fn contain<T>(context: &str, f: impl FnOnce() -> EvaluationResult<T>) -> EvaluationResult<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("Contained panic in {context}: {message}");
            Err(EvaluationError::Panic {
                context: context.to_string(),
                message,
            })
        }
    }
}

/// Text carried by a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_contained_panic() {
        let result: EvaluationResult<()> = contain("Explode", || panic!("boom {}", 1));
        assert_eq!(
            result,
            Err(EvaluationError::Panic {
                context: "Explode".into(),
                message: "boom 1".into(),
            })
        );
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(contain("ok", || Ok(5)), Ok(5));
    }
}
