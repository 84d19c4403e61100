use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dynamic values carried by effects, actions, states, return values and errors.
/// All values are immutable once yielded and compare structurally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    /// Absent value
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    /// Plain object (ordered by key for determinism)
    Map(BTreeMap<String, Value>),
    /// Instance of a named class, e.g. an error type
    Instance {
        class: String,
        fields: BTreeMap<String, Value>,
    },
    /// Reference to a host function by name
    FnRef(String),
    /// Opaque runtime handle (task, channel)
    Handle { kind: String, id: u64 },
}

impl Value {
    /// Build a plain object from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn func(name: impl Into<String>) -> Self {
        Value::FnRef(name.into())
    }

    pub fn instance<K, I>(class: impl Into<String>, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Instance {
            class: class.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Error instance of the given class carrying a `message` field.
    pub fn error(class: impl Into<String>, message: impl Into<String>) -> Self {
        Value::instance(class, [("message", Value::String(message.into()))])
    }

    pub fn task(id: u64) -> Self {
        Value::Handle { kind: "task".into(), id }
    }

    pub fn channel(id: u64) -> Self {
        Value::Handle { kind: "channel".into(), id }
    }

    /// Field lookup on maps and instances.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(key),
            Value::Instance { fields, .. } => fields.get(key),
            _ => None,
        }
    }

    /// Positional lookup on lists.
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(items) => items.get(index),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Handle id when this value is a handle of the given kind.
    pub fn handle_id(&self, expected_kind: &str) -> Option<u64> {
        match self {
            Value::Handle { kind, id } if kind == expected_kind => Some(*id),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_)
            | Value::Map(_)
            | Value::Instance { .. }
            | Value::FnRef(_)
            | Value::Handle { .. } => true,
        }
    }

    /// Whether this value is an instance of `class`.
    ///
    /// The built-in error classes (`TypeError`, `RangeError`, ...) are also
    /// instances of `Error`. Instances carry no parent chain, so any other
    /// class matches by exact name only.
    pub fn is_instance_of(&self, class: &str) -> bool {
        match self {
            Value::Instance { class: own, .. } => {
                own == class || (class == "Error" && BUILTIN_ERRORS.contains(&own.as_str()))
            }
            _ => false,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Constructor-like name of the value: the class for instances,
    /// otherwise the primitive type name.
    pub fn class_name(&self) -> &str {
        match self {
            Value::Instance { class, .. } => class,
            Value::Map(_) => "Object",
            Value::List(_) => "Array",
            other => other.type_name(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::List(_) | Value::Map(_) | Value::Instance { .. } => "object",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::FnRef(_) => "function",
            Value::Handle { .. } => "handle",
        }
    }

    /// Single-line rendering used in diagnostics.
    pub fn inspect(&self) -> String {
        crate::inspect::inspect(self)
    }

    /// Multi-line rendering used for diffs.
    pub fn pretty(&self) -> String {
        crate::inspect::pretty(self)
    }
}

const BUILTIN_ERRORS: &[&str] = &[
    "AggregateError",
    "EvalError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "TypeError",
    "URIError",
];

/// Deep equality. Numbers compare by value whether stored as `Int` or
/// `Float`, and `NaN` equals `NaN`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::String(a), Value::String(b)) | (Value::FnRef(a), Value::FnRef(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (
                Value::Instance { class: ac, fields: af },
                Value::Instance { class: bc, fields: bf },
            ) => ac == bc && af == bf,
            (Value::Handle { kind: ak, id: ai }, Value::Handle { kind: bk, id: bi }) => {
                ak == bk && ai == bi
            }
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x == y || (x.is_nan() && y.is_nan()),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// JSON literals map onto plain data: objects become maps, `null` stays null.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}
