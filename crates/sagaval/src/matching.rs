use std::collections::BTreeMap;

use crate::value::Value;

/// Partial structural match: does `actual` contain everything `partial` describes?
///
/// Maps and instances match when every key of `partial` is present in
/// `actual` and matches recursively; extra keys in `actual` are ignored.
/// Lists match when every element of `partial` matches some element of
/// `actual`. Everything else compares by equality.
pub fn is_match(actual: &Value, partial: &Value) -> bool {
    match (actual, partial) {
        (Value::Map(a), Value::Map(p)) => entries_match(a, p),
        (
            Value::Instance { class: ac, fields: af },
            Value::Instance { class: pc, fields: pf },
        ) => ac == pc && entries_match(af, pf),
        (Value::List(a), Value::List(p)) => {
            p.len() <= a.len() && p.iter().all(|pv| a.iter().any(|av| is_match(av, pv)))
        }
        _ => actual == partial,
    }
}

fn entries_match(actual: &BTreeMap<String, Value>, partial: &BTreeMap<String, Value>) -> bool {
    partial
        .iter()
        .all(|(k, pv)| actual.get(k).is_some_and(|av| is_match(av, pv)))
}
