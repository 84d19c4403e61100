#[cfg(test)]
mod tests {
    use crate::*;
    use sagaprobe_value::Value;
    use serde_json::json;

    fn done(payload: i64) -> Value {
        Value::from(json!({ "type": "DONE", "payload": payload }))
    }

    #[test]
    fn test_effect_kind_roundtrip() {
        for kind in [
            EffectKind::Put,
            EffectKind::Call,
            EffectKind::ActionChannel,
            EffectKind::GetContext,
            EffectKind::Flush,
        ] {
            assert_eq!(EffectKind::parse_str(kind.as_str()), Some(kind));
        }
        assert_eq!(EffectKind::parse_str("BOGUS"), None);
        assert_eq!(EffectKind::SetContext.to_string(), "SET_CONTEXT");
    }

    #[test]
    fn test_constructor_names() {
        assert_eq!(put(done(1)).constructor_name(), "put");
        assert_eq!(put_resolve(done(1)).constructor_name(), "putResolve");
        assert_eq!(spawn("worker", vec![]).constructor_name(), "spawn");
        assert_eq!(fork("worker", vec![]).constructor_name(), "fork");
        assert_eq!(take_maybe("PING").constructor_name(), "takeMaybe");
        assert_eq!(action_channel("PING", None).constructor_name(), "actionChannel");
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(call("fetch", vec![Value::Int(1)]), call("fetch", vec![Value::Int(1)]));
        assert_ne!(call("fetch", vec![Value::Int(1)]), call("fetch", vec![Value::Int(2)]));
        assert_ne!(call("fetch", vec![]), cps("fetch", vec![]));
    }

    #[test]
    fn test_payload_value_shapes() {
        let effect = apply(Value::string("api"), "load", vec![Value::Int(21)]);
        let payload = effect.payload_value();
        assert_eq!(payload.get("fn"), Some(&Value::func("load")));
        assert_eq!(payload.get("context"), Some(&Value::string("api")));
        assert_eq!(payload.get("args"), Some(&Value::list([Value::Int(21)])));

        let put_payload = put(done(3)).payload_value();
        assert_eq!(put_payload.get("action"), Some(&done(3)));
        assert_eq!(put_payload.get("channel"), None);

        let effect_value = take("PING").to_value();
        assert_eq!(effect_value.get("type"), Some(&Value::string("TAKE")));
    }

    #[test]
    fn test_serialize_put() {
        assert_eq!(serialize_effect(&put(done(43))), "put({ payload: 43, type: 'DONE' })");
        assert_eq!(
            serialize_effect(&put_resolve(Value::from(json!({ "type": "X" })))),
            "putResolve({ type: 'X' })"
        );
        assert_eq!(
            serialize_effect(&put_channel(Value::channel(1), Value::from(json!({ "type": "X" })))),
            "put([channel #1], { type: 'X' })"
        );
    }

    #[test]
    fn test_serialize_call_like() {
        assert_eq!(
            serialize_effect(&call("identity", vec!["foo".into()])),
            "call([Function: identity], 'foo')"
        );
        assert_eq!(
            serialize_effect(&apply(Value::string("ctx"), "load", vec![Value::Int(21)])),
            "call({ context: 'ctx', fn: [Function: load] }, 21)"
        );
        assert_eq!(serialize_effect(&cps("handler", vec![])), "cps([Function: handler])");
        assert_eq!(serialize_effect(&spawn("worker", vec![])), "spawn([Function: worker])");
        assert_eq!(serialize_effect(&fork("worker", vec![Value::Int(1)])), "fork([Function: worker], 1)");
    }

    #[test]
    fn test_serialize_take_variants() {
        assert_eq!(serialize_effect(&take("PING")), "take('PING')");
        assert_eq!(serialize_effect(&take_maybe("PING")), "takeMaybe('PING')");
        assert_eq!(serialize_effect(&take_channel(Value::channel(2))), "take(channel)");
    }

    #[test]
    fn test_serialize_race_contains_branches() {
        let left = call("fetchUser", vec![]);
        let right = delay(500);
        let serialized = serialize_effect(&race(vec![left.clone(), right.clone()]));
        assert!(serialized.contains(&serialize_effect(&left)));
        assert!(serialized.contains(&serialize_effect(&right)));
        assert_eq!(
            serialized,
            "race([call([Function: fetchUser]), call([Function: delay], 500)])"
        );
    }

    #[test]
    fn test_serialize_keyed_all() {
        let effect = all_keyed([("user", call("fetchUser", vec![])), ("timeout", delay(10))]);
        assert_eq!(
            serialize_effect(&effect),
            "all({\n  user: call([Function: fetchUser]),\n  timeout: call([Function: delay], 10),\n})"
        );
    }

    #[test]
    fn test_keyed_race_keeps_declaration_order() {
        let effect = race_keyed([("timeout", delay(1000)), ("response", call("fetch", vec![]))]);
        assert_eq!(
            serialize_effect(&effect),
            "race({\n  timeout: call([Function: delay], 1000),\n  response: call([Function: fetch]),\n})"
        );
        // Key order does not change which effect it is.
        let reordered = race_keyed([("response", call("fetch", vec![])), ("timeout", delay(1000))]);
        assert_eq!(effect, reordered);
    }

    #[test]
    fn test_serialize_remaining_kinds() {
        assert_eq!(serialize_effect(&select_state()), "select([Function: identity])");
        assert_eq!(
            serialize_effect(&select("getUser", vec![Value::Int(1)])),
            "select([Function: getUser], 1)"
        );
        assert_eq!(serialize_effect(&action_channel("PING", None)), "actionChannel('PING')");
        assert_eq!(serialize_effect(&get_context("api")), "getContext('api')");
        assert_eq!(
            serialize_effect(&set_context([("api", Value::Int(1))])),
            "setContext({ api: 1 })"
        );
        assert_eq!(serialize_effect(&join(Value::task(1))), "join([task #1])");
        assert_eq!(serialize_effect(&cancelled()), "cancelled()");
    }

    #[test]
    fn test_serialize_unknown_falls_back_to_inspect() {
        let effect = Effect::Unknown {
            kind: "CUSTOM".into(),
            payload: Value::Int(1),
        };
        assert_eq!(serialize_effect(&effect), "{ payload: 1, type: 'CUSTOM' }");
    }

    #[test]
    fn test_serialize_effects_separator() {
        let effects = vec![take("A"), take("B")];
        assert_eq!(serialize_effects(&effects, "\n"), "take('A')\ntake('B')");
    }

    #[test]
    fn test_effect_serde_roundtrip() {
        let effect = race_keyed([("a", take("A")), ("b", delay(5))]);
        let json = serde_json::to_string(&effect).unwrap();
        let restored: Effect = serde_json::from_str(&json).unwrap();
        assert_eq!(effect, restored);
    }
}
