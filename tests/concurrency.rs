//! One engine shared across threads

use okra_expr::{Engine, EngineConfig, Value};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_evaluation_sees_its_own_data() {
    let engine = Engine::with_config(EngineConfig::new().with_cache_capacity(16));

    thread::scope(|scope| {
        for worker in 0..8i64 {
            let engine = &engine;
            scope.spawn(move || {
                for step in 0..200i64 {
                    let data = HashMap::from([("n".to_string(), worker), ("m".to_string(), step)]);
                    let result = engine.eval("n * 1000 + m", &data).unwrap();
                    assert_eq!(result, Value::Integer(worker * 1000 + step));
                }
            });
        }
    });

    let stats = engine.cache_stats();
    assert_eq!(stats.hits + stats.misses, 1600);
    assert_eq!(stats.entries, 1);
}

#[test]
fn registration_during_evaluation() {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = Engine::new();
    engine
        .register_function("version", |_: &[Value]| Ok(Value::Integer(0)))
        .unwrap();

    thread::scope(|scope| {
        let writer = &engine;
        scope.spawn(move || {
            for version in 1..=100i64 {
                writer
                    .register_function("version", move |_: &[Value]| Ok(Value::Integer(version)))
                    .unwrap();
                writer
                    .register_function(&format!("extra{version}"), |_: &[Value]| Ok(Value::Nil))
                    .unwrap();
            }
        });

        for _ in 0..4 {
            let reader = &engine;
            scope.spawn(move || {
                let mut last = 0;
                for _ in 0..500 {
                    let Value::Integer(seen) = reader.eval("version()", &()).unwrap() else {
                        panic!("version() should return an integer");
                    };
                    // A snapshot never goes backwards
                    assert!(seen >= last, "saw {seen} after {last}");
                    last = seen;
                }
            });
        }
    });

    assert_eq!(engine.eval("version()", &()).unwrap(), Value::Integer(100));
    assert_eq!(engine.functions().snapshot().len(), 2 + 1 + 100);
}

#[test]
fn functions_can_register_while_evaluating() {
    let engine = Arc::new(Engine::new());
    let handle = Arc::downgrade(&engine);
    engine
        .register_function("install", move |_: &[Value]| {
            let Some(engine) = handle.upgrade() else {
                anyhow::bail!("engine dropped");
            };
            engine.register_function("late", |_: &[Value]| Ok(Value::Integer(1)))?;
            Ok(Value::Boolean(true))
        })
        .unwrap();

    // The running evaluation keeps the snapshot it started with
    assert!(engine.eval("install() && late() == 1", &()).is_err());
    assert_eq!(engine.eval("late()", &()).unwrap(), Value::Integer(1));
}

#[test]
fn engines_do_not_share_registrations() {
    let engines: Vec<Engine> = (0..4).map(|_| Engine::new()).collect();

    thread::scope(|scope| {
        for (id, engine) in engines.iter().enumerate() {
            scope.spawn(move || {
                let id = id as i64;
                engine
                    .register_function("id", move |_: &[Value]| Ok(Value::Integer(id)))
                    .unwrap();
            });
        }
    });

    for (id, engine) in engines.iter().enumerate() {
        assert_eq!(engine.eval("id()", &()).unwrap(), Value::Integer(id as i64));
    }
}
