use sagaprobe_value::{is_match, Value};

use crate::host::HostFunctions;

/// Whether a `take` pattern accepts `action`.
///
/// `"*"` and an absent pattern accept everything, a string compares against
/// the action's `type`, a list accepts when any member does, a function
/// reference is called as a predicate, and a map partially matches.
pub fn matches_action(pattern: &Value, action: &Value, host: &HostFunctions) -> bool {
    match pattern {
        Value::Undefined => true,
        Value::String(s) if s == "*" => true,
        Value::String(s) => action.get("type").and_then(Value::as_str) == Some(s.as_str()),
        Value::List(patterns) => patterns.iter().any(|p| matches_action(p, action, host)),
        Value::FnRef(name) => host
            .call_plain(name, std::slice::from_ref(action))
            .is_ok_and(|v| v.is_truthy()),
        Value::Map(_) => is_match(action, pattern),
        other => other == action,
    }
}
