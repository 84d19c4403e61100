use sagaprobe_effect::{self as fx, Effect, EffectKind};
use sagaprobe_runtime::{
    Computation, HostFunctions, ProviderSet, RunConfig, RunDriver, RunRecord,
};
use sagaprobe_value::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::diagnostics::{AnsiDiagnostics, Diagnostics, PlainDiagnostics};
use crate::error::ExpectError;
use crate::expectation::{ErrorMatcher, Expectation, ExpectationEngine};

type ReducerFn = Box<dyn Fn(&Value, &Value) -> Value>;

/// Start an assertion run for `saga`.
pub fn expect_saga(saga: impl Computation + 'static) -> ExpectSaga {
    ExpectSaga::new(Box::new(saga))
}

/// Registration surface: stub providers and expectations are registered up
/// front, then [`ExpectSaga::run`] drives the saga once and evaluates every
/// expectation in registration order.
pub struct ExpectSaga {
    saga: Box<dyn Computation>,
    providers: ProviderSet,
    host: HostFunctions,
    reducer: Option<ReducerFn>,
    state: Value,
    context: BTreeMap<String, Value>,
    dispatches: Vec<Value>,
    config: RunConfig,
    diagnostics: Box<dyn Diagnostics>,
    expectations: Vec<Expectation>,
    negate_next: bool,
}

impl ExpectSaga {
    pub fn new(saga: Box<dyn Computation>) -> Self {
        ExpectSaga {
            saga,
            providers: ProviderSet::new(),
            host: HostFunctions::new(),
            reducer: None,
            state: Value::Undefined,
            context: BTreeMap::new(),
            dispatches: Vec::new(),
            config: RunConfig::default(),
            diagnostics: Box::new(PlainDiagnostics),
            expectations: Vec::new(),
            negate_next: false,
        }
    }

    /// Add stub providers; repeated calls append to the chain.
    pub fn provide(mut self, providers: ProviderSet) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn with_host(mut self, host: HostFunctions) -> Self {
        self.host = host;
        self
    }

    pub fn with_reducer(mut self, reducer: impl Fn(&Value, &Value) -> Value + 'static) -> Self {
        self.reducer = Some(Box::new(reducer));
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn dispatch(mut self, action: Value) -> Self {
        self.dispatches.push(action);
        self
    }

    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Color failure messages for a terminal.
    pub fn colored(self) -> Self {
        self.with_diagnostics(AnsiDiagnostics)
    }

    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Negate the next expectation.
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negate_next = true;
        self
    }

    /// Register an expectation; a pending `not()` negates it.
    pub fn expect(mut self, expectation: Expectation) -> Self {
        let expectation = if std::mem::take(&mut self.negate_next) {
            negate(expectation)
        } else {
            expectation
        };
        self.expectations.push(expectation);
        self
    }

    /// The exact effect happens.
    pub fn effect(self, effect: Effect) -> Self {
        self.expect(Expectation::occurrence(effect, true))
    }

    /// An effect of `kind` whose payload partially matches happens.
    pub fn like(self, kind: EffectKind, payload: Value) -> Self {
        self.expect(Expectation::like(kind, payload, true))
    }

    pub fn put(self, action: Value) -> Self {
        self.effect(fx::put(action))
    }

    pub fn put_resolve(self, action: Value) -> Self {
        self.effect(fx::put_resolve(action))
    }

    /// A put whose action partially matches.
    pub fn put_like(self, action: Value) -> Self {
        self.expect(Expectation::like(EffectKind::Put, Value::map([("action", action)]), true).named("put"))
    }

    pub fn call(self, func: &str, args: Vec<Value>) -> Self {
        self.effect(fx::call(func, args))
    }

    /// A call to `func`, whatever its arguments.
    pub fn call_fn(self, func: &str) -> Self {
        self.expect(
            Expectation::like(EffectKind::Call, Value::map([("fn", Value::func(func))]), true).named("call"),
        )
    }

    pub fn apply(self, context: Value, func: &str, args: Vec<Value>) -> Self {
        self.expect(Expectation::occurrence(fx::apply(context, func, args), true).named("apply"))
    }

    pub fn cps(self, func: &str, args: Vec<Value>) -> Self {
        self.effect(fx::cps(func, args))
    }

    pub fn fork(self, func: &str, args: Vec<Value>) -> Self {
        self.effect(fx::fork(func, args))
    }

    pub fn spawn(self, func: &str, args: Vec<Value>) -> Self {
        self.effect(fx::spawn(func, args))
    }

    pub fn take(self, pattern: impl Into<Value>) -> Self {
        self.effect(fx::take(pattern))
    }

    pub fn take_maybe(self, pattern: impl Into<Value>) -> Self {
        self.effect(fx::take_maybe(pattern))
    }

    pub fn select(self, selector: &str, args: Vec<Value>) -> Self {
        self.effect(fx::select(selector, args))
    }

    pub fn race(self, effects: Vec<Effect>) -> Self {
        self.effect(fx::race(effects))
    }

    pub fn all(self, effects: Vec<Effect>) -> Self {
        self.effect(fx::all(effects))
    }

    pub fn action_channel(self, pattern: impl Into<Value>, buffer: Option<Value>) -> Self {
        self.effect(fx::action_channel(pattern, buffer))
    }

    pub fn get_context(self, key: &str) -> Self {
        self.effect(fx::get_context(key))
    }

    pub fn set_context(self, props: BTreeMap<String, Value>) -> Self {
        self.effect(Effect::SetContext(props))
    }

    pub fn returns(self, value: Value) -> Self {
        self.expect(Expectation::Return {
            value,
            expected: true,
        })
    }

    pub fn has_final_state(self, state: Value) -> Self {
        self.expect(Expectation::State {
            state,
            expected: true,
        })
    }

    /// The saga throws an instance of `class`.
    pub fn throws(self, class: &str) -> Self {
        self.expect(Expectation::Throw {
            matcher: ErrorMatcher::Type(class.to_string()),
            expected: true,
        })
    }

    /// The saga throws a value deep-equal to `error`.
    pub fn throws_value(self, error: Value) -> Self {
        self.expect(Expectation::Throw {
            matcher: ErrorMatcher::Value(error),
            expected: true,
        })
    }

    /// Drive the saga once and evaluate every expectation.
    ///
    /// Assertion failures are reported first, all of them; after that an
    /// error thrown by the saga surfaces unchanged unless a `throws`
    /// expectation claimed it.
    pub fn run(self) -> Result<RunRecord, ExpectError> {
        let mut driver = RunDriver::new(self.providers, self.host)
            .with_state(self.state)
            .with_config(self.config);
        if let Some(reducer) = self.reducer {
            driver = driver.with_reducer(reducer);
        }
        for (key, value) in self.context {
            driver = driver.with_context(key, value);
        }
        for action in self.dispatches {
            driver = driver.dispatch(action);
        }

        debug!(expectations = self.expectations.len(), "running saga");
        let mut record = driver.run(self.saga)?;

        let engine = ExpectationEngine::new(self.diagnostics);
        let failures = engine.evaluate(&self.expectations, &mut record);
        if !failures.is_empty() {
            return Err(ExpectError::Assertion(failures));
        }

        let claimed = self.expectations.iter().any(Expectation::expects_throw);
        if let Some(error) = record.outcome.error_value() {
            if !claimed {
                return Err(ExpectError::Uncaught(error.clone()));
            }
        }
        Ok(record)
    }
}

fn negate(expectation: Expectation) -> Expectation {
    match expectation {
        Expectation::Occurrence {
            name,
            pattern,
            expected,
        } => Expectation::Occurrence {
            name,
            pattern,
            expected: !expected,
        },
        Expectation::Return { value, expected } => Expectation::Return {
            value,
            expected: !expected,
        },
        Expectation::State { state, expected } => Expectation::State {
            state,
            expected: !expected,
        },
        Expectation::Throw { matcher, expected } => Expectation::Throw {
            matcher,
            expected: !expected,
        },
    }
}
