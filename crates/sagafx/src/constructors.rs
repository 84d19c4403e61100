//! Constructor functions mirroring the effect vocabulary a saga yields.

use indexmap::IndexMap;
use sagaprobe_value::Value;

use crate::effect::{Branches, CallDescriptor, Effect, TakeSource};

pub fn put(action: Value) -> Effect {
    Effect::Put {
        channel: None,
        action,
        resolve: false,
    }
}

pub fn put_resolve(action: Value) -> Effect {
    Effect::Put {
        channel: None,
        action,
        resolve: true,
    }
}

/// Put into a channel instead of the store.
pub fn put_channel(channel: Value, action: Value) -> Effect {
    Effect::Put {
        channel: Some(channel),
        action,
        resolve: false,
    }
}

pub fn call(func: impl Into<String>, args: Vec<Value>) -> Effect {
    Effect::Call(CallDescriptor::new(func, args))
}

/// Call with a bound context, like `call([context, fn], ...args)`.
pub fn apply(context: Value, func: impl Into<String>, args: Vec<Value>) -> Effect {
    Effect::Call(CallDescriptor::with_context(context, func, args))
}

pub fn cps(func: impl Into<String>, args: Vec<Value>) -> Effect {
    Effect::Cps(CallDescriptor::new(func, args))
}

pub fn fork(func: impl Into<String>, args: Vec<Value>) -> Effect {
    Effect::Fork {
        call: CallDescriptor::new(func, args),
        detached: false,
    }
}

pub fn spawn(func: impl Into<String>, args: Vec<Value>) -> Effect {
    Effect::Fork {
        call: CallDescriptor::new(func, args),
        detached: true,
    }
}

pub fn take(pattern: impl Into<Value>) -> Effect {
    Effect::Take {
        source: TakeSource::Pattern(pattern.into()),
        maybe: false,
    }
}

pub fn take_maybe(pattern: impl Into<Value>) -> Effect {
    Effect::Take {
        source: TakeSource::Pattern(pattern.into()),
        maybe: true,
    }
}

pub fn take_channel(channel: Value) -> Effect {
    Effect::Take {
        source: TakeSource::Channel(channel),
        maybe: false,
    }
}

pub fn race(effects: Vec<Effect>) -> Effect {
    Effect::Race(Branches::List(effects))
}

pub fn race_keyed<K: Into<String>>(effects: impl IntoIterator<Item = (K, Effect)>) -> Effect {
    Effect::Race(Branches::Keyed(keyed(effects)))
}

pub fn all(effects: Vec<Effect>) -> Effect {
    Effect::All(Branches::List(effects))
}

pub fn all_keyed<K: Into<String>>(effects: impl IntoIterator<Item = (K, Effect)>) -> Effect {
    Effect::All(Branches::Keyed(keyed(effects)))
}

/// `select()` with no selector reads the whole state.
pub fn select_state() -> Effect {
    select("identity", Vec::new())
}

pub fn select(selector: impl Into<String>, args: Vec<Value>) -> Effect {
    Effect::Select {
        selector: selector.into(),
        args,
    }
}

pub fn action_channel(pattern: impl Into<Value>, buffer: Option<Value>) -> Effect {
    Effect::ActionChannel {
        pattern: pattern.into(),
        buffer,
    }
}

pub fn get_context(key: impl Into<String>) -> Effect {
    Effect::GetContext(key.into())
}

pub fn set_context<K: Into<String>>(props: impl IntoIterator<Item = (K, Value)>) -> Effect {
    Effect::SetContext(props.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

pub fn join(task: Value) -> Effect {
    Effect::Join(task)
}

pub fn cancel(task: Value) -> Effect {
    Effect::Cancel(task)
}

pub fn cancelled() -> Effect {
    Effect::Cancelled
}

pub fn flush(channel: Value) -> Effect {
    Effect::Flush(channel)
}

/// Timer effect; `delay` is a host function like any other call.
pub fn delay(ms: i64) -> Effect {
    call("delay", vec![Value::Int(ms)])
}

fn keyed<K: Into<String>>(effects: impl IntoIterator<Item = (K, Effect)>) -> IndexMap<String, Effect> {
    effects.into_iter().map(|(k, e)| (k.into(), e)).collect()
}
