use sagaprobe_effect::*;
use sagaprobe_expect::*;
use sagaprobe_runtime::{HostFunctions, Resume, RunConfig, RunError, Script, Step};
use sagaprobe_value::Value;
use serde_json::json;
use std::collections::BTreeMap;

fn action(kind: &str) -> Value {
    Value::map([("type", Value::string(kind))])
}

// === Occurrences ===

#[test]
fn test_asserts_yielded_effects_in_any_order() {
    let saga = Script::new()
        .effect(call("identity", vec![Value::Int(1)]))
        .effect(put(action("LOADED")))
        .effect(select_state());
    expect_saga(saga)
        .select("identity", vec![])
        .put(action("LOADED"))
        .call("identity", vec![Value::Int(1)])
        .run()
        .unwrap();
}

#[test]
fn test_each_expectation_consumes_one_occurrence() {
    let saga = Script::new().effect(put(action("A")));
    let err = expect_saga(saga)
        .put(action("A"))
        .put(action("A"))
        .run()
        .unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Expected put effect to happen, but it never did."));
}

#[test]
fn test_negated_occurrence() {
    expect_saga(Script::new().effect(put(action("A"))))
        .not()
        .put(action("B"))
        .run()
        .unwrap();
    let err = expect_saga(Script::new().effect(put(action("A"))))
        .not()
        .put(action("A"))
        .run()
        .unwrap_err();
    assert!(err.to_string().to_lowercase().contains("not to happen, but it did"));
}

#[test]
fn test_partial_put_match() {
    let saga = Script::new().effect(put(Value::from(json!({
        "type": "SAVE",
        "payload": { "id": 7, "tags": ["a"] }
    }))));
    expect_saga(saga)
        .put_like(Value::from(json!({ "type": "SAVE", "payload": { "id": 7 } })))
        .run()
        .unwrap();
}

#[test]
fn test_call_fn_ignores_arguments() {
    let saga = Script::new().effect(call("identity", vec![Value::Int(99)]));
    expect_saga(saga).call_fn("identity").run().unwrap();
}

#[test]
fn test_every_failure_is_collected() {
    let saga = Script::new().ret(Value::Int(1));
    let err = expect_saga(saga)
        .put(action("A"))
        .returns(Value::Int(2))
        .run()
        .unwrap_err();
    assert_eq!(err.failures().len(), 2);
    assert!(err.failures()[1]
        .message
        .starts_with("Expected the saga to return given value."));
}

#[test]
fn test_colored_failures_keep_message_text() {
    let saga = Script::new().effect(put(action("A")));
    let err = expect_saga(saga)
        .colored()
        .put(action("B"))
        .run()
        .unwrap_err();
    assert!(err.to_string().contains("put({ type: 'B' })"));
}

// === Dispatch and take ===

#[test]
fn test_dispatched_action_satisfies_take() {
    logging::init_test_logging();
    let saga = Script::new()
        .effect(take("PING"))
        .then(|received: &[Value]| {
            let kind = received[0].get("type").cloned().unwrap_or_default();
            Step::Effect(put(Value::map([("type", Value::string("PONG")), ("for", kind)])))
        });
    expect_saga(saga)
        .dispatch(action("PING"))
        .take("PING")
        .put(Value::from(json!({ "type": "PONG", "for": "PING" })))
        .run()
        .unwrap();
}

#[test]
fn test_put_wakes_forked_watcher() {
    logging::init_test_logging();
    let host = HostFunctions::new().with_saga("watcher", |_| {
        Script::new()
            .effect(take("PING"))
            .effect(put(action("PONG")))
            .boxed()
    });
    let saga = Script::new()
        .effect(fork("watcher", vec![]))
        .effect(put(action("PING")));
    expect_saga(saga)
        .with_host(host)
        .fork("watcher", vec![])
        .put(action("PONG"))
        .run()
        .unwrap();
}

#[test]
fn test_action_channel_occurrence() {
    let saga = Script::new().effect(action_channel("REQUEST", None));
    expect_saga(saga)
        .action_channel("REQUEST", None)
        .run()
        .unwrap();
}

// === State and context ===

fn counter(state: &Value, action: &Value) -> Value {
    let count = state.get("count").and_then(Value::as_int).unwrap_or(0);
    match action.get("type").and_then(Value::as_str) {
        Some("INC") => Value::map([("count", Value::Int(count + 1))]),
        _ => state.clone(),
    }
}

#[test]
fn test_final_state_reduces_puts() {
    let saga = Script::new()
        .effect(put(action("INC")))
        .effect(put(action("INC")))
        .effect(put(action("NOOP")));
    expect_saga(saga)
        .with_reducer(counter)
        .with_state(Value::map([("count", Value::Int(0))]))
        .has_final_state(Value::map([("count", Value::Int(2))]))
        .run()
        .unwrap();
}

#[test]
fn test_final_state_failure_shows_diff() {
    let saga = Script::new().effect(put(action("INC")));
    let err = expect_saga(saga)
        .with_reducer(counter)
        .with_state(Value::map([("count", Value::Int(0))]))
        .has_final_state(Value::map([("count", Value::Int(5))]))
        .run()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Expected saga to have final store state."));
    assert!(message.contains("-   count: 5,"));
    assert!(message.contains("+   count: 1,"));
}

#[test]
fn test_select_reads_reduced_state() {
    let host = HostFunctions::new().with("getCount", |args| {
        Ok(args
            .first()
            .and_then(|state| state.get("count"))
            .cloned()
            .unwrap_or_default())
    });
    let saga = Script::new()
        .effect(put(action("INC")))
        .effect(select("getCount", vec![]))
        .then(|received: &[Value]| Step::Return(received[1].clone()));
    expect_saga(saga)
        .with_host(host)
        .with_reducer(counter)
        .with_state(Value::map([("count", Value::Int(10))]))
        .select("getCount", vec![])
        .returns(Value::Int(11))
        .run()
        .unwrap();
}

#[test]
fn test_context_round_trip() {
    let mut props = BTreeMap::new();
    props.insert("locale".to_string(), Value::string("fr"));
    let saga = Script::new()
        .effect(get_context("api"))
        .effect(set_context(props.clone()))
        .effect(get_context("locale"))
        .then(|received: &[Value]| Step::Return(Value::list(received.iter().cloned())));
    expect_saga(saga)
        .with_context("api", Value::string("v2"))
        .get_context("api")
        .set_context(props)
        .returns(Value::list([Value::string("v2"), Value::Undefined, Value::string("fr")]))
        .run()
        .unwrap();
}

// === Combinators ===

#[test]
fn test_race_occurrence() {
    let saga = Script::new().effect(race(vec![take("CANCEL"), delay(100)]));
    expect_saga(saga)
        .race(vec![take("CANCEL"), delay(100)])
        .run()
        .unwrap();
}

#[test]
fn test_missing_race_message() {
    let saga = Script::new().effect(race(vec![take("CANCEL"), delay(100)]));
    let err = expect_saga(saga)
        .race(vec![take("STOP"), delay(100)])
        .run()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Expected race effect to happen, but it never did."));
    assert!(message.contains("Received: race([take('STOP'), call([Function: delay], 100)])"));
}

#[test]
fn test_race_losing_branch_is_asserted() {
    let host = HostFunctions::new().with("fetch", |_| Ok(Value::string("body")));
    let saga = Script::new()
        .effect(race_keyed([("response", call("fetch", vec![])), ("timeout", delay(1000))]))
        .then(|received: &[Value]| Step::Return(received[0].clone()));
    expect_saga(saga)
        .with_host(host)
        .call("fetch", vec![])
        .effect(delay(1000))
        .returns(Value::map([("response", Value::string("body"))]))
        .run()
        .unwrap();
}

#[test]
fn test_all_waits_for_dispatched_actions() {
    let saga = Script::new()
        .effect(all(vec![take("A"), take("B")]))
        .then(|received: &[Value]| Step::Return(received[0].clone()));
    expect_saga(saga)
        .dispatch(action("A"))
        .dispatch(action("B"))
        .take("A")
        .take("B")
        .returns(Value::list([action("A"), action("B")]))
        .run()
        .unwrap();
}

#[test]
fn test_all_occurrence() {
    let saga = Script::new().effect(all(vec![call("identity", vec![Value::Int(1)]), delay(10)]));
    expect_saga(saga)
        .all(vec![call("identity", vec![Value::Int(1)]), delay(10)])
        .run()
        .unwrap();
}

// === Run limits ===

#[test]
fn test_step_limit_surfaces_as_run_error() {
    logging::init_test_logging();
    let mut ticks = 0_i64;
    let saga = move |_: Resume| {
        ticks += 1;
        Step::Effect(call("identity", vec![Value::Int(ticks)]))
    };
    let err = expect_saga(saga)
        .config(RunConfig::default().with_max_steps(50))
        .run()
        .unwrap_err();
    assert!(matches!(err, ExpectError::Run(RunError::StepLimitExceeded(50))));
}
