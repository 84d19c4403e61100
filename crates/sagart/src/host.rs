use sagaprobe_value::Value;
use std::collections::BTreeMap;

use crate::computation::Computation;

/// Host function result: `Err` is a value thrown into the caller.
pub type HostResult = Result<Value, Value>;

type PlainFn = Box<dyn Fn(&[Value]) -> HostResult>;
type SagaFn = Box<dyn Fn(&[Value]) -> Box<dyn Computation>>;

enum HostFn {
    Plain(PlainFn),
    /// Calling it starts a child computation.
    Saga(SagaFn),
}

/// Outcome of looking up and invoking a host function.
pub enum Invocation {
    Value(HostResult),
    Saga(Box<dyn Computation>),
    Missing,
}

/// Named functions that call-style effects refer to.
///
/// `delay` and `identity` are always registered: timers resolve at once,
/// and `identity` is the default selector.
pub struct HostFunctions {
    fns: BTreeMap<String, HostFn>,
}

impl Default for HostFunctions {
    fn default() -> Self {
        Self::new()
    }
}

impl HostFunctions {
    pub fn new() -> Self {
        let mut host = HostFunctions {
            fns: BTreeMap::new(),
        };
        host.register("delay", |_| Ok(Value::Bool(true)));
        host.register("identity", |args| Ok(args.first().cloned().unwrap_or_default()));
        host
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> HostResult + 'static,
    ) -> &mut Self {
        self.fns.insert(name.into(), HostFn::Plain(Box::new(f)));
        self
    }

    pub fn register_saga(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&[Value]) -> Box<dyn Computation> + 'static,
    ) -> &mut Self {
        self.fns.insert(name.into(), HostFn::Saga(Box::new(factory)));
        self
    }

    pub fn with(mut self, name: impl Into<String>, f: impl Fn(&[Value]) -> HostResult + 'static) -> Self {
        self.register(name, f);
        self
    }

    pub fn with_saga(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(&[Value]) -> Box<dyn Computation> + 'static,
    ) -> Self {
        self.register_saga(name, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }

    pub fn invoke(&self, name: &str, args: &[Value]) -> Invocation {
        match self.fns.get(name) {
            Some(HostFn::Plain(f)) => Invocation::Value(f(args)),
            Some(HostFn::Saga(factory)) => Invocation::Saga(factory(args)),
            None => Invocation::Missing,
        }
    }

    /// Invoke a plain function; sagas and unknown names become thrown errors.
    pub fn call_plain(&self, name: &str, args: &[Value]) -> HostResult {
        match self.invoke(name, args) {
            Invocation::Value(result) => result,
            Invocation::Saga(_) => Err(Value::error(
                "TypeError",
                format!("`{name}` is a saga and cannot be called synchronously"),
            )),
            Invocation::Missing => Err(missing_function(name)),
        }
    }
}

pub(crate) fn missing_function(name: &str) -> Value {
    Value::error("Error", format!("no host function registered for `{name}`"))
}
