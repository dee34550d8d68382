//! Expression engine - the main entry point for evaluation

use crate::ast::ExpressionNode;
use crate::cache::{CacheStats, ExpressionCache};
use crate::error::{OkraError, Result};
use crate::evaluator::{EvaluationContext, ExpressionEvaluator, fault};
use crate::model::{FromValue, ToValue, Value};
use crate::parser::{DEFAULT_MAX_DEPTH, parse_with_max_depth};
use crate::registry::FunctionRegistry;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Context reported when the top-level fault barrier fires
const EVAL_CONTEXT: &str = "eval";

/// Engine configuration
///
/// ```
/// use okra_expr::EngineConfig;
///
/// let config = EngineConfig::new().with_max_depth(64).with_cache_capacity(512);
/// assert_eq!(config.max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum nesting depth accepted by the parser
    pub max_depth: usize,
    /// Parsed expressions kept in the LRU cache (0 disables caching)
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            cache_capacity: 0,
        }
    }
}

impl EngineConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parser nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the parsed-expression cache size
    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }
}

/// Expression engine
///
/// An engine is cheap to share: every method takes `&self`, evaluations on
/// different threads proceed independently, and function registration swaps
/// in a new table without disturbing evaluations already running.
///
/// ```
/// use okra_expr::{Engine, Value};
/// use std::collections::HashMap;
///
/// let engine = Engine::new();
/// let data = HashMap::from([("price".to_string(), 10), ("qty".to_string(), 3)]);
/// assert_eq!(engine.eval("price * qty", &data).unwrap(), Value::Integer(30));
/// ```
#[derive(Debug)]
pub struct Engine {
    functions: FunctionRegistry,
    config: EngineConfig,
    cache: Option<ExpressionCache>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with the built-in functions and default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Engine with a custom configuration
    pub fn with_config(config: EngineConfig) -> Self {
        let cache = NonZeroUsize::new(config.cache_capacity).map(ExpressionCache::new);
        log::debug!(
            "Created engine (max_depth: {}, cache_capacity: {})",
            config.max_depth,
            config.cache_capacity
        );
        Self {
            functions: FunctionRegistry::new(),
            config,
            cache,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// This engine's function registry
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Parse and evaluate `expression` against `data`
    ///
    /// Composite data passed by reference is copied once into shared
    /// storage; pass an `Arc` to evaluate against it in place. Panics raised
    /// by host code are caught and returned as errors.
    pub fn eval<D: ToValue + ?Sized>(&self, expression: &str, data: &D) -> Result<Value> {
        let ast = self.compile(expression)?;
        self.evaluate_ast(&ast, data)
    }

    /// Evaluate and convert the result to a host type
    ///
    /// ```
    /// use okra_expr::Engine;
    ///
    /// let engine = Engine::new();
    /// let truncated: i32 = engine.eval_to("7 / 2.0", &()).unwrap();
    /// assert_eq!(truncated, 3);
    /// ```
    pub fn eval_to<T: FromValue, D: ToValue + ?Sized>(&self, expression: &str, data: &D) -> Result<T> {
        let value = self.eval(expression, data)?;
        Ok(T::from_value(value)?)
    }

    /// Evaluate an already parsed expression
    pub fn evaluate_ast<D: ToValue + ?Sized>(&self, ast: &ExpressionNode, data: &D) -> Result<Value> {
        let functions = self.functions.snapshot();
        log::trace!("Evaluating {ast}");
        fault::contain(EVAL_CONTEXT, || {
            let context = EvaluationContext::new(data.to_value(), functions);
            ExpressionEvaluator::new(&context).evaluate(ast)
        })
        .map_err(OkraError::from)
    }

    /// Parse without evaluating, using this engine's depth limit
    pub fn parse_expr(&self, expression: &str) -> Result<ExpressionNode> {
        Ok(parse_with_max_depth(expression, self.config.max_depth)?)
    }

    /// Parse through the cache when it is enabled
    fn compile(&self, expression: &str) -> Result<Arc<ExpressionNode>> {
        let max_depth = self.config.max_depth;
        let parse = |input: &str| {
            parse_with_max_depth(input, max_depth).inspect_err(|err| {
                log::debug!("Rejected {input:?} at {:?}: {err}", err.position());
            })
        };
        let ast = match &self.cache {
            Some(cache) => cache.get_or_parse(expression, parse)?,
            None => Arc::new(parse(expression)?),
        };
        Ok(ast)
    }

    /// Add or replace a function callable from expressions
    ///
    /// Names are case-insensitive. Only this engine is affected.
    ///
    /// ```
    /// use okra_expr::{Engine, Value};
    ///
    /// let engine = Engine::new();
    /// engine
    ///     .register_function("double", |args: &[Value]| {
    ///         Ok(Value::Integer(args[0].as_i64().unwrap_or_default() * 2))
    ///     })
    ///     .unwrap();
    /// assert_eq!(engine.eval("double(21)", &()).unwrap(), Value::Integer(42));
    /// ```
    pub fn register_function<F>(&self, name: &str, function: F) -> Result<()>
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Ok(self.functions.register(name, Some(Arc::new(function)))?)
    }

    /// Parsed-expression cache statistics (all zero when caching is off)
    pub fn cache_stats(&self) -> CacheStats {
        self.cache
            .as_ref()
            .map(ExpressionCache::stats)
            .unwrap_or_default()
    }

    /// Drop every cached expression
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}

/// Parse an expression with the default depth limit
///
/// ```
/// let ast = okra_expr::parse_expr("a.b ? 'x' : -1").unwrap();
/// assert_eq!(ast.to_string(), "(a.b ? \"x\" : (-1))");
/// ```
pub fn parse_expr(expression: &str) -> Result<ExpressionNode> {
    Ok(crate::parser::parse_expression(expression)?)
}
