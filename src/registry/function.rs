//! Function registry with copy-on-write snapshots

use crate::model::Value;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Host callable exposed to expressions as `name(args...)`
pub type CustomFunction = Arc<dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Function name is empty
    #[error("func name cannot be empty")]
    EmptyName,

    /// No callable supplied for the name
    #[error("func {name} cannot be nil")]
    MissingFunction {
        /// Name being registered
        name: String,
    },
}

/// Immutable name to function table
///
/// Names are stored lowercased, so lookups are case-insensitive.
#[derive(Clone, Default)]
pub struct FunctionSnapshot {
    functions: FxHashMap<String, CustomFunction>,
}

impl FunctionSnapshot {
    /// Snapshot holding only the built-in functions
    pub fn builtins() -> Self {
        let mut snapshot = Self::default();
        super::functions::register_builtin_functions(&mut snapshot);
        snapshot
    }

    /// Look up a function, ignoring case
    pub fn get(&self, name: &str) -> Option<&CustomFunction> {
        self.functions.get(&name.to_lowercase())
    }

    /// Whether a function with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// True when there are no functions
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered names, lowercased and sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn insert(&mut self, name: &str, function: CustomFunction) -> Option<CustomFunction> {
        self.functions.insert(name.to_lowercase(), function)
    }
}

impl fmt::Debug for FunctionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSnapshot")
            .field("functions", &self.names())
            .finish()
    }
}

/// Built-in table shared by every registry until its first registration
static DEFAULT_FUNCTIONS: Lazy<Arc<FunctionSnapshot>> =
    Lazy::new(|| Arc::new(FunctionSnapshot::builtins()));

/// Per-engine function table
///
/// Readers clone the current snapshot pointer and keep it for a whole
/// evaluation; the lock is held only for that clone, never across a call.
/// Registration copies the table, applies the change and swaps
/// the pointer, so readers never see a partial update. Racing writers are
/// last-write-wins.
pub struct FunctionRegistry {
    current: RwLock<Arc<FunctionSnapshot>>,
}

impl FunctionRegistry {
    /// Registry starting from the built-in functions
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::clone(&DEFAULT_FUNCTIONS)),
        }
    }

    /// Consistent view for one evaluation
    pub fn snapshot(&self) -> Arc<FunctionSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Add or replace a function
    ///
    /// Only this registry changes; other engines and the shared built-in
    /// table are unaffected.
    pub fn register(&self, name: &str, function: Option<CustomFunction>) -> RegistryResult<()> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let function = function.ok_or_else(|| RegistryError::MissingFunction {
            name: name.to_string(),
        })?;

        let mut current = self.current.write();
        let mut next = FunctionSnapshot::clone(&current);
        let replaced = next.insert(name, function).is_some();
        *current = Arc::new(next);

        if replaced {
            log::debug!("Overrode function '{name}'");
        } else {
            log::debug!("Registered function '{name}'");
        }
        Ok(())
    }

    /// Look up a function in the current snapshot
    pub fn get(&self, name: &str) -> Option<CustomFunction> {
        self.snapshot().get(name).cloned()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("current", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NO_ARGS: &[Value] = &[];

    fn constant(value: i64) -> CustomFunction {
        Arc::new(move |_: &[Value]| -> anyhow::Result<Value> { Ok(Value::Integer(value)) })
    }

    #[test]
    fn test_builtins_present() {
        let registry = FunctionRegistry::new();
        assert_eq!(registry.snapshot().names(), vec!["len", "now"]);
        assert!(registry.snapshot().contains("LEN"));
    }

    #[test]
    fn test_registration_errors() {
        let registry = FunctionRegistry::new();
        assert_eq!(
            registry.register("", Some(constant(1))),
            Err(RegistryError::EmptyName)
        );
        assert_eq!(
            registry.register("f", None),
            Err(RegistryError::MissingFunction { name: "f".into() })
        );
        assert_eq!(registry.snapshot().len(), 2);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let registry = FunctionRegistry::new();
        let before = registry.snapshot();
        registry.register("Answer", Some(constant(42))).unwrap();

        assert!(!before.contains("answer"));
        let after = registry.snapshot();
        let answer = after.get("ANSWER").unwrap();
        assert_eq!(answer(NO_ARGS).unwrap(), Value::Integer(42));
    }

    #[test]
    fn test_override_is_local() {
        let first = FunctionRegistry::new();
        let second = FunctionRegistry::new();
        first.register("len", Some(constant(-1))).unwrap();

        let overridden = first.get("len").unwrap();
        assert_eq!(overridden(NO_ARGS).unwrap(), Value::Integer(-1));
        let builtin = second.get("len").unwrap();
        assert_eq!(builtin(NO_ARGS).unwrap(), Value::Integer(0));
    }
}
