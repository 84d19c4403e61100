use sagaprobe_effect::*;
use sagaprobe_expect::*;
use sagaprobe_runtime::Script;
use sagaprobe_value::Value;

#[test]
fn test_empty_report_for_no_effects() {
    assert_eq!(report_actual_effects(&[]), "");
}

#[test]
fn test_report_contains_each_serialized_effect() {
    let effects = vec![
        call("identity", vec!["foo".into()]),
        call("identity", vec!["bar".into()]),
        call("identity", vec!["baz".into()]),
    ];
    let report = report_actual_effects(&effects);
    for effect in &effects {
        assert!(report.contains(&serialize_effect(effect)));
    }
}

#[test]
fn test_missing_effect_failure_lists_same_kind_only() {
    let saga = Script::new()
        .effect(call("identity", vec!["foo".into()]))
        .effect(put(Value::map([("type", Value::string("A"))])));
    let err = expect_saga(saga)
        .call("identity", vec!["bar".into()])
        .run()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Actual effects"));
    assert!(message.contains("  call([Function: identity], 'foo')"));
    assert!(!message.contains("put({ type: 'A' })"));
    assert!(message.ends_with("Received: call([Function: identity], 'bar')"));
}
