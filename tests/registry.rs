//! Function registration through the engine

use okra_expr::{
    CustomFunction, Engine, EvaluationError, FunctionRegistry, OkraError, RegistryError,
    Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sum(args: &[Value]) -> anyhow::Result<Value> {
    let mut total = 0;
    for arg in args {
        match arg {
            Value::Integer(i) => total += i,
            other => anyhow::bail!("cannot add {}", other.type_name()),
        }
    }
    Ok(Value::Integer(total))
}

#[test]
fn registered_functions_are_callable() {
    init_logging();
    let engine = Engine::new();
    engine.register_function("sum", sum).unwrap();

    assert_eq!(engine.eval("sum(1, 2, 3)", &()).unwrap(), Value::Integer(6));
    assert_eq!(engine.eval("SUM()", &()).unwrap(), Value::Integer(0));
    assert_eq!(
        engine.eval("sum(a, b) * 2", &json!({"a": 4, "b": 5})).unwrap(),
        Value::Integer(18)
    );
}

#[test]
fn mixed_case_names_are_reachable() {
    let engine = Engine::new();
    engine
        .register_function("IsAdult", |args: &[Value]| {
            Ok(Value::Boolean(args.first().and_then(Value::as_i64) >= Some(18)))
        })
        .unwrap();

    let person = json!({"age": 30});
    assert_eq!(engine.eval("IsAdult(age)", &person).unwrap(), Value::Boolean(true));
    assert_eq!(engine.eval("isadult(age)", &person).unwrap(), Value::Boolean(true));
}

#[test]
fn host_errors_carry_the_function_name() {
    let engine = Engine::new();
    engine.register_function("sum", sum).unwrap();

    assert_eq!(
        engine.eval("Sum(1, 'x')", &()),
        Err(OkraError::Evaluation(EvaluationError::Function {
            name: "Sum".into(),
            message: "cannot add string".into(),
        }))
    );

    engine
        .register_function("fetch", |_: &[Value]| {
            Err(anyhow::anyhow!("timeout").context("fetching rates"))
        })
        .unwrap();
    let err = engine.eval("fetch()", &()).unwrap_err();
    assert_eq!(err.to_string(), "fetch: fetching rates: timeout");
}

#[test]
fn overriding_builtins_is_local_to_one_engine() {
    init_logging();
    let custom = Engine::new();
    custom
        .register_function("len", |_: &[Value]| Ok(Value::Integer(-1)))
        .unwrap();

    assert_eq!(custom.eval("len('abc')", &()).unwrap(), Value::Integer(-1));
    assert_eq!(Engine::new().eval("len('abc')", &()).unwrap(), Value::Integer(3));
    // The receiver form never consults the registry
    assert_eq!(custom.eval("'abc'.len()", &()).unwrap(), Value::Integer(3));
}

#[test]
fn invalid_registrations_are_rejected() {
    let engine = Engine::new();
    assert_eq!(
        engine.register_function("", sum),
        Err(OkraError::Registry(RegistryError::EmptyName))
    );

    let registry = FunctionRegistry::new();
    let err = registry.register("sum", None).unwrap_err();
    assert_eq!(err.to_string(), "func sum cannot be nil");
    assert!(registry.get("sum").is_none());
}

#[test]
fn snapshots_are_immutable() {
    let registry = FunctionRegistry::new();
    let before = registry.snapshot();
    assert_eq!(before.names(), vec!["len", "now"]);

    let double: CustomFunction = Arc::new(sum);
    registry.register("Double", Some(double)).unwrap();
    let after = registry.snapshot();

    assert!(!before.contains("double"));
    assert!(after.contains("DOUBLE"));
    assert_eq!(after.names(), vec!["double", "len", "now"]);
    assert_eq!(after.len(), before.len() + 1);
}
