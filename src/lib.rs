//! Embeddable expression engine
//!
//! Evaluates a small expression language (arithmetic, comparisons, logic,
//! ternaries, member/index access, method and function calls) against
//! arbitrary host data. Host values are reached through the [`Reflect`]
//! introspection contract; hosts extend the language by registering
//! functions on an [`Engine`].
//!
//! ```
//! use okra_expr::{Engine, Value};
//! use serde_json::json;
//!
//! let engine = Engine::new();
//! let order = json!({"items": [{"price": 5}, {"price": 7}], "vip": true});
//!
//! let total = engine.eval("items[0].price + items[1].price", &order).unwrap();
//! assert_eq!(total, Value::Integer(12));
//!
//! let label: String = engine.eval_to("vip ? 'gold' : 'standard'", &order).unwrap();
//! assert_eq!(label, "gold");
//! ```

pub mod ast;
pub mod cache;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod registry;

mod stack;

// Re-export main types
pub use ast::ExpressionNode;
pub use cache::CacheStats;
pub use engine::{Engine, EngineConfig, parse_expr};
pub use error::{OkraError, Result};
pub use evaluator::EvaluationError;
pub use model::{
    FromValue, MapKey, Member, MethodSignature, ObjectKind, ObjectRef, ParamKind, Record,
    RecordBuilder, Reflect, ToValue, Value,
};
pub use parser::ParseError;
pub use registry::{CustomFunction, FunctionRegistry, RegistryError};
