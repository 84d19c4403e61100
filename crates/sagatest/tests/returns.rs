use sagaprobe_effect::*;
use sagaprobe_expect::*;
use sagaprobe_runtime::{HostFunctions, Script};
use sagaprobe_value::Value;
use serde_json::json;

fn foo_bar() -> Value {
    Value::from(json!({ "foo": "bar" }))
}

fn hello_world() -> Value {
    Value::from(json!({ "hello": "world" }))
}

fn saga() -> Script {
    Script::new().ret(foo_bar())
}

fn other_saga_host() -> HostFunctions {
    HostFunctions::new().with_saga("otherSaga", |_| {
        Script::new().effect(delay(200)).ret(hello_world()).boxed()
    })
}

#[test]
fn test_asserts_return_value() {
    expect_saga(saga()).returns(foo_bar()).run().unwrap();
}

#[test]
fn test_numeric_return_compares_by_value() {
    expect_saga(Script::new().ret(Value::Int(63)))
        .returns(Value::Float(63.0))
        .run()
        .unwrap();
    expect_saga(Script::new().ret(Value::from(json!({ "total": 2.0 }))))
        .returns(Value::map([("total", Value::Int(2))]))
        .run()
        .unwrap();
}

#[test]
fn test_negative_return_assertion_passes() {
    expect_saga(saga()).not().returns(hello_world()).run().unwrap();
}

#[test]
fn test_return_assertion_fails() {
    let err = expect_saga(saga()).returns(hello_world()).run().unwrap_err();
    assert!(err.to_string().to_lowercase().contains("expected the saga to return"));
}

#[test]
fn test_negative_return_assertion_fails() {
    let err = expect_saga(saga()).not().returns(foo_bar()).run().unwrap_err();
    assert!(err.to_string().to_lowercase().contains("expected the saga not to return"));
}

#[test]
fn test_called_sagas_do_not_affect_return_value() {
    let local = Script::new()
        .effect(call("otherSaga", vec![]))
        .ret(foo_bar());
    expect_saga(local)
        .with_host(other_saga_host())
        .returns(foo_bar())
        .run()
        .unwrap();
}

#[test]
fn test_forked_sagas_do_not_affect_return_value() {
    let local = Script::new()
        .effect(fork("otherSaga", vec![]))
        .ret(foo_bar());
    let record = expect_saga(local)
        .with_host(other_saga_host())
        .returns(foo_bar())
        .run()
        .unwrap();
    // The fork still ran and its effects were recorded.
    assert!(record.effect_log.contains(&delay(200)));
}

#[test]
fn test_spawned_sagas_do_not_affect_return_value() {
    let local = Script::new()
        .effect(spawn("otherSaga", vec![]))
        .ret(foo_bar());
    expect_saga(local)
        .with_host(other_saga_host())
        .returns(foo_bar())
        .run()
        .unwrap();
}
