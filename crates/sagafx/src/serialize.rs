use sagaprobe_value::Value;

use crate::effect::{Branches, CallDescriptor, Effect, TakeSource};

/// Render an effect as the constructor call that would build it,
/// e.g. `put({ type: 'DONE' })` or `call([Function: fetchUser], 1)`.
pub fn serialize_effect(effect: &Effect) -> String {
    match effect {
        Effect::Put {
            channel, action, ..
        } => {
            let args: Vec<String> = [channel.as_ref(), Some(action)]
                .into_iter()
                .flatten()
                .filter(|v| v.is_truthy())
                .map(Value::inspect)
                .collect();
            format!("{}({})", effect.constructor_name(), args.join(", "))
        }
        Effect::Call(call) | Effect::Cps(call) | Effect::Fork { call, .. } => {
            format!("{}({})", effect.constructor_name(), call_args(call))
        }
        Effect::Take { source, .. } => {
            let arg = match source {
                TakeSource::Pattern(pattern) => pattern.inspect(),
                TakeSource::Channel(_) => "channel".to_string(),
            };
            format!("{}({arg})", effect.constructor_name())
        }
        Effect::Race(branches) | Effect::All(branches) => {
            format!("{}({})", effect.constructor_name(), combinator_arg(branches))
        }
        Effect::Select { selector, args } => {
            let mut parts = vec![Value::FnRef(selector.clone()).inspect()];
            parts.extend(args.iter().map(Value::inspect));
            format!("select({})", parts.join(", "))
        }
        Effect::ActionChannel { pattern, buffer } => {
            let args: Vec<String> = [Some(pattern), buffer.as_ref()]
                .into_iter()
                .flatten()
                .filter(|v| v.is_truthy())
                .map(Value::inspect)
                .collect();
            format!("actionChannel({})", args.join(", "))
        }
        Effect::GetContext(key) => format!("getContext({})", Value::string(key.as_str())),
        Effect::SetContext(props) => format!("setContext({})", Value::Map(props.clone())),
        Effect::Join(task) => format!("join({task})"),
        Effect::Cancel(task) => format!("cancel({task})"),
        Effect::Cancelled => "cancelled()".to_string(),
        Effect::Flush(channel) => format!("flush({channel})"),
        Effect::Unknown { .. } => effect.to_value().inspect(),
    }
}

/// Serialize each effect and join them with `separator`.
pub fn serialize_effects(effects: &[Effect], separator: &str) -> String {
    effects
        .iter()
        .map(serialize_effect)
        .collect::<Vec<_>>()
        .join(separator)
}

fn call_args(call: &CallDescriptor) -> String {
    let func = Value::FnRef(call.func.clone());
    let mut parts = Vec::with_capacity(call.args.len() + 1);
    match &call.context {
        Some(context) if context.is_truthy() => {
            parts.push(Value::map([("context", context.clone()), ("fn", func)]).inspect());
        }
        _ => parts.push(func.inspect()),
    }
    parts.extend(call.args.iter().map(Value::inspect));
    parts.join(", ")
}

fn combinator_arg(branches: &Branches) -> String {
    match branches {
        Branches::List(effects) => format!("[{}]", serialize_effects(effects, ", ")),
        Branches::Keyed(effects) => {
            let body = effects.iter().fold(String::new(), |mut out, (key, effect)| {
                out.push_str(&format!("  {key}: {},\n", serialize_effect(effect)));
                out
            });
            format!("{{\n{body}}}")
        }
    }
}
