use indexmap::IndexMap;
use sagaprobe_value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A declarative side effect yielded by a saga.
///
/// Effects are plain data: yielding one asks the driver to perform (or stub)
/// the side effect and resume the saga with its result. Two effects are the
/// same effect when they are structurally equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Dispatch an action to the store, or to a channel when one is given.
    Put {
        channel: Option<Value>,
        action: Value,
        /// `putResolve`: wait for the dispatch result.
        resolve: bool,
    },
    Call(CallDescriptor),
    /// Node-style callback invocation.
    Cps(CallDescriptor),
    Fork {
        call: CallDescriptor,
        /// Spawned tasks are detached from their parent.
        detached: bool,
    },
    /// Wait for a matching action.
    Take {
        source: TakeSource,
        /// `takeMaybe`: the non-terminating variant.
        maybe: bool,
    },
    Race(Branches),
    All(Branches),
    /// Read derived state through a selector.
    Select { selector: String, args: Vec<Value> },
    ActionChannel {
        pattern: Value,
        buffer: Option<Value>,
    },
    GetContext(String),
    SetContext(BTreeMap<String, Value>),
    Join(Value),
    Cancel(Value),
    /// Whether the yielding task was cancelled. The run driver never resumes
    /// a cancelled task, so a task that can yield this always sees `false`.
    Cancelled,
    Flush(Value),
    /// Effect of a kind this crate does not model.
    Unknown { kind: String, payload: Value },
}

/// Payload shared by call-style effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDescriptor {
    /// Bound execution context (`apply`/`call([ctx, fn])`).
    pub context: Option<Value>,
    /// Name of the host function.
    pub func: String,
    pub args: Vec<Value>,
}

impl CallDescriptor {
    pub fn new(func: impl Into<String>, args: Vec<Value>) -> Self {
        CallDescriptor {
            context: None,
            func: func.into(),
            args,
        }
    }

    pub fn with_context(context: Value, func: impl Into<String>, args: Vec<Value>) -> Self {
        CallDescriptor {
            context: Some(context),
            func: func.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TakeSource {
    Pattern(Value),
    Channel(Value),
}

/// Branches of a `race`/`all` combinator, either positional or keyed.
/// Keyed branches keep their declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Branches {
    List(Vec<Effect>),
    Keyed(IndexMap<String, Effect>),
}

impl Branches {
    pub fn len(&self) -> usize {
        match self {
            Branches::List(effects) => effects.len(),
            Branches::Keyed(effects) => effects.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Branch effects in order.
    pub fn effects(&self) -> Vec<&Effect> {
        match self {
            Branches::List(effects) => effects.iter().collect(),
            Branches::Keyed(effects) => effects.values().collect(),
        }
    }
}

/// Discriminant of an effect, used to partition stores and providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Put,
    Call,
    Cps,
    Fork,
    Take,
    Race,
    All,
    Select,
    ActionChannel,
    GetContext,
    SetContext,
    Join,
    Cancel,
    Cancelled,
    Flush,
    Unknown,
}

impl EffectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Put => "PUT",
            EffectKind::Call => "CALL",
            EffectKind::Cps => "CPS",
            EffectKind::Fork => "FORK",
            EffectKind::Take => "TAKE",
            EffectKind::Race => "RACE",
            EffectKind::All => "ALL",
            EffectKind::Select => "SELECT",
            EffectKind::ActionChannel => "ACTION_CHANNEL",
            EffectKind::GetContext => "GET_CONTEXT",
            EffectKind::SetContext => "SET_CONTEXT",
            EffectKind::Join => "JOIN",
            EffectKind::Cancel => "CANCEL",
            EffectKind::Cancelled => "CANCELLED",
            EffectKind::Flush => "FLUSH",
            EffectKind::Unknown => "UNKNOWN",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "PUT" => Some(EffectKind::Put),
            "CALL" => Some(EffectKind::Call),
            "CPS" => Some(EffectKind::Cps),
            "FORK" => Some(EffectKind::Fork),
            "TAKE" => Some(EffectKind::Take),
            "RACE" => Some(EffectKind::Race),
            "ALL" => Some(EffectKind::All),
            "SELECT" => Some(EffectKind::Select),
            "ACTION_CHANNEL" => Some(EffectKind::ActionChannel),
            "GET_CONTEXT" => Some(EffectKind::GetContext),
            "SET_CONTEXT" => Some(EffectKind::SetContext),
            "JOIN" => Some(EffectKind::Join),
            "CANCEL" => Some(EffectKind::Cancel),
            "CANCELLED" => Some(EffectKind::Cancelled),
            "FLUSH" => Some(EffectKind::Flush),
            _ => None,
        }
    }

    /// Lower-camel name used in diagnostics (`put`, `actionChannel`).
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Put => "put",
            EffectKind::Call => "call",
            EffectKind::Cps => "cps",
            EffectKind::Fork => "fork",
            EffectKind::Take => "take",
            EffectKind::Race => "race",
            EffectKind::All => "all",
            EffectKind::Select => "select",
            EffectKind::ActionChannel => "actionChannel",
            EffectKind::GetContext => "getContext",
            EffectKind::SetContext => "setContext",
            EffectKind::Join => "join",
            EffectKind::Cancel => "cancel",
            EffectKind::Cancelled => "cancelled",
            EffectKind::Flush => "flush",
            EffectKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::Put { .. } => EffectKind::Put,
            Effect::Call(_) => EffectKind::Call,
            Effect::Cps(_) => EffectKind::Cps,
            Effect::Fork { .. } => EffectKind::Fork,
            Effect::Take { .. } => EffectKind::Take,
            Effect::Race(_) => EffectKind::Race,
            Effect::All(_) => EffectKind::All,
            Effect::Select { .. } => EffectKind::Select,
            Effect::ActionChannel { .. } => EffectKind::ActionChannel,
            Effect::GetContext(_) => EffectKind::GetContext,
            Effect::SetContext(_) => EffectKind::SetContext,
            Effect::Join(_) => EffectKind::Join,
            Effect::Cancel(_) => EffectKind::Cancel,
            Effect::Cancelled => EffectKind::Cancelled,
            Effect::Flush(_) => EffectKind::Flush,
            Effect::Unknown { .. } => EffectKind::Unknown,
        }
    }

    /// Name of the constructor that builds this effect (`putResolve`, `spawn`, `takeMaybe`).
    pub fn constructor_name(&self) -> &'static str {
        match self {
            Effect::Put { resolve: true, .. } => "putResolve",
            Effect::Fork { detached: true, .. } => "spawn",
            Effect::Take { maybe: true, .. } => "takeMaybe",
            other => other.kind().name(),
        }
    }

    /// Call payload of call-style effects (`call`, `cps`, `fork`).
    pub fn call_descriptor(&self) -> Option<&CallDescriptor> {
        match self {
            Effect::Call(call) | Effect::Cps(call) | Effect::Fork { call, .. } => Some(call),
            _ => None,
        }
    }

    /// Arguments of call-style and select effects; empty for everything else.
    pub fn args(&self) -> &[Value] {
        match self {
            Effect::Call(call) | Effect::Cps(call) | Effect::Fork { call, .. } => &call.args,
            Effect::Select { args, .. } => args,
            _ => &[],
        }
    }

    /// The effect's payload as a plain value, for partial matching.
    pub fn payload_value(&self) -> Value {
        match self {
            Effect::Put {
                channel,
                action,
                resolve,
            } => {
                let mut entries = BTreeMap::new();
                if let Some(channel) = channel {
                    entries.insert("channel".to_string(), channel.clone());
                }
                entries.insert("action".to_string(), action.clone());
                entries.insert("resolve".to_string(), Value::Bool(*resolve));
                Value::Map(entries)
            }
            Effect::Call(call) | Effect::Cps(call) => call_payload(call),
            Effect::Fork { call, detached } => {
                let mut payload = call_payload(call);
                if let Value::Map(entries) = &mut payload {
                    entries.insert("detached".to_string(), Value::Bool(*detached));
                }
                payload
            }
            Effect::Take { source, maybe } => {
                let (key, value) = match source {
                    TakeSource::Pattern(pattern) => ("pattern", pattern.clone()),
                    TakeSource::Channel(channel) => ("channel", channel.clone()),
                };
                Value::map([(key, value), ("maybe", Value::Bool(*maybe))])
            }
            Effect::Race(branches) | Effect::All(branches) => match branches {
                Branches::List(effects) => Value::List(effects.iter().map(Effect::to_value).collect()),
                Branches::Keyed(effects) => Value::Map(
                    effects.iter().map(|(k, e)| (k.clone(), e.to_value())).collect(),
                ),
            },
            Effect::Select { selector, args } => Value::map([
                ("selector", Value::FnRef(selector.clone())),
                ("args", Value::List(args.clone())),
            ]),
            Effect::ActionChannel { pattern, buffer } => {
                let mut entries = BTreeMap::new();
                entries.insert("pattern".to_string(), pattern.clone());
                if let Some(buffer) = buffer {
                    entries.insert("buffer".to_string(), buffer.clone());
                }
                Value::Map(entries)
            }
            Effect::GetContext(key) => Value::String(key.clone()),
            Effect::SetContext(props) => Value::Map(props.clone()),
            Effect::Join(task) | Effect::Cancel(task) => task.clone(),
            Effect::Flush(channel) => channel.clone(),
            Effect::Cancelled => Value::Undefined,
            Effect::Unknown { payload, .. } => payload.clone(),
        }
    }

    /// The whole effect as `{ type, payload }`.
    pub fn to_value(&self) -> Value {
        let kind = match self {
            Effect::Unknown { kind, .. } => kind.clone(),
            other => other.kind().as_str().to_string(),
        };
        Value::map([("type", Value::String(kind)), ("payload", self.payload_value())])
    }
}

fn call_payload(call: &CallDescriptor) -> Value {
    let mut entries = BTreeMap::new();
    if let Some(context) = &call.context {
        entries.insert("context".to_string(), context.clone());
    }
    entries.insert("fn".to_string(), Value::FnRef(call.func.clone()));
    entries.insert("args".to_string(), Value::List(call.args.clone()));
    Value::Map(entries)
}
