#[cfg(test)]
mod tests {
    use crate::*;
    use serde_json::json;

    #[test]
    fn test_inspect_scalars() {
        assert_eq!(Value::Int(42).inspect(), "42");
        assert_eq!(Value::Float(1.5).inspect(), "1.5");
        assert_eq!(Value::string("hi").inspect(), "'hi'");
        assert_eq!(Value::string("it's").inspect(), "'it\\'s'");
        assert_eq!(Value::Undefined.inspect(), "undefined");
        assert_eq!(Value::Null.inspect(), "null");
        assert_eq!(Value::func("fetchUser").inspect(), "[Function: fetchUser]");
        assert_eq!(Value::task(3).inspect(), "[task #3]");
    }

    #[test]
    fn test_inspect_collections() {
        let action = Value::from(json!({ "type": "DONE", "payload": 43 }));
        assert_eq!(action.inspect(), "{ payload: 43, type: 'DONE' }");
        assert_eq!(Value::list([]).inspect(), "[]");
        assert_eq!(Value::list([Value::Int(1), Value::Int(2)]).inspect(), "[ 1, 2 ]");
        assert_eq!(
            Value::map([("content-type", Value::string("json"))]).inspect(),
            "{ 'content-type': 'json' }"
        );
        assert_eq!(
            Value::error("CustomError", "boom").inspect(),
            "CustomError { message: 'boom' }"
        );
    }

    #[test]
    fn test_pretty_nests_with_indentation() {
        let value = Value::from(json!({ "foo": { "bar": [1] } }));
        assert_eq!(value.pretty(), "{\n  foo: {\n    bar: [\n      1,\n    ],\n  },\n}");
        assert_eq!(Value::Map(Default::default()).pretty(), "{}");
    }

    #[test]
    fn test_is_match_ignores_extra_keys() {
        let actual = Value::from(json!({ "type": "FETCH", "payload": { "id": 1, "page": 2 } }));
        assert!(is_match(&actual, &Value::from(json!({ "type": "FETCH" }))));
        assert!(is_match(&actual, &Value::from(json!({ "payload": { "id": 1 } }))));
        assert!(!is_match(&actual, &Value::from(json!({ "payload": { "id": 2 } }))));
        assert!(!is_match(&actual, &Value::from(json!({ "missing": null }))));
    }

    #[test]
    fn test_is_match_lists_and_instances() {
        let args = Value::from(json!([1, 2, 3]));
        assert!(is_match(&args, &Value::from(json!([3]))));
        assert!(!is_match(&args, &Value::from(json!([4]))));
        assert!(!is_match(&Value::from(json!([1])), &Value::from(json!([1, 1]))));

        let err = Value::instance("HttpError", [("status", Value::Int(500)), ("url", "/x".into())]);
        assert!(is_match(&err, &Value::instance("HttpError", [("status", Value::Int(500))])));
        assert!(!is_match(&err, &Value::instance("IoError", [("status", Value::Int(500))])));
    }

    #[test]
    fn test_class_name_and_instance_check() {
        let err = Value::error("CustomError", "x");
        assert!(err.is_instance_of("CustomError"));
        assert!(!err.is_instance_of("Error"));
        assert!(Value::error("TypeError", "x").is_instance_of("Error"));
        assert!(!Value::error("Error", "x").is_instance_of("TypeError"));
        assert!(!Value::from(json!({ "message": "x" })).is_instance_of("Error"));
        assert_eq!(err.class_name(), "CustomError");
        assert_eq!(Value::from(json!({})).class_name(), "Object");
        assert_eq!(Value::Int(1).class_name(), "number");
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert_eq!(Value::Int(63), Value::Float(63.0));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Int(63), Value::Float(63.5));
        assert_ne!(Value::Int(1), Value::string("1"));
        assert_eq!(
            Value::from(json!({ "total": 2.0, "items": [1, 2] })),
            Value::map([
                ("total", Value::Int(2)),
                ("items", Value::list([Value::Float(1.0), Value::Int(2)])),
            ])
        );
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::from(json!({ "n": 1, "f": 0.5, "s": "x", "l": [true, null] }));
        assert_eq!(value.get("n"), Some(&Value::Int(1)));
        assert_eq!(value.get("f"), Some(&Value::Float(0.5)));
        assert_eq!(value.get("l").and_then(|l| l.at(1)), Some(&Value::Null));
    }

    #[test]
    fn test_value_serde_roundtrip() {
        let value = Value::list([Value::error("E", "m"), Value::channel(2), Value::Undefined]);
        let json = serde_json::to_string(&value).unwrap();
        let restored: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, restored);
    }

    #[test]
    fn test_diff_lines_marks_changes() {
        let lines = diff_lines("{\n  a: 1,\n  b: 2,\n}", "{\n  a: 1,\n  b: 3,\n}");
        assert_eq!(
            lines,
            vec![
                DiffLine::Same("{".into()),
                DiffLine::Same("  a: 1,".into()),
                DiffLine::Expected("  b: 2,".into()),
                DiffLine::Received("  b: 3,".into()),
                DiffLine::Same("}".into()),
            ]
        );
    }

    #[test]
    fn test_diff_lines_identical_input() {
        let lines = diff_lines("x\ny", "x\ny");
        assert!(lines.iter().all(|l| matches!(l, DiffLine::Same(_))));
        assert_eq!(lines.len(), 2);
    }
}
