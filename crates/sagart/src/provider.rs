use sagaprobe_effect::{Effect, EffectKind};
use sagaprobe_value::{is_match, Value};
use std::collections::BTreeMap;
use tracing::trace;

/// Result of consulting the provider chain for an effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Provision {
    /// Resume the computation with this value instead of performing the effect.
    Stub(Value),
    /// Throw this value into the computation at the yield point.
    Fail(Value),
    /// No provider stubbed the effect; perform it.
    Defer,
}

/// An interceptor for one effect kind.
///
/// `next` continues to the following provider, or to the static providers
/// once the chain is exhausted.
pub trait Provider {
    fn provide(&self, effect: &Effect, next: &dyn Fn() -> Provision) -> Provision;
}

impl<F> Provider for F
where
    F: Fn(&Effect, &dyn Fn() -> Provision) -> Provision,
{
    fn provide(&self, effect: &Effect, next: &dyn Fn() -> Provision) -> Provision {
        self(effect, next)
    }
}

/// Selects which effects a static provider applies to.
pub enum EffectMatcher {
    /// Deep equality with the yielded effect.
    Exact(Effect),
    /// Same kind, and the payload partially matches.
    Like { kind: EffectKind, payload: Value },
    Predicate(Box<dyn Fn(&Effect) -> bool>),
}

impl EffectMatcher {
    pub fn like(kind: EffectKind, payload: Value) -> Self {
        EffectMatcher::Like { kind, payload }
    }

    /// Any `call` to the named function, whatever its arguments or context.
    pub fn call_fn(func: impl Into<String>) -> Self {
        Self::fn_of(EffectKind::Call, func)
    }

    pub fn cps_fn(func: impl Into<String>) -> Self {
        Self::fn_of(EffectKind::Cps, func)
    }

    pub fn fork_fn(func: impl Into<String>) -> Self {
        Self::fn_of(EffectKind::Fork, func)
    }

    /// Every effect of a kind.
    pub fn kind(kind: EffectKind) -> Self {
        EffectMatcher::Predicate(Box::new(move |effect| effect.kind() == kind))
    }

    pub fn predicate(f: impl Fn(&Effect) -> bool + 'static) -> Self {
        EffectMatcher::Predicate(Box::new(f))
    }

    fn fn_of(kind: EffectKind, func: impl Into<String>) -> Self {
        Self::like(kind, Value::map([("fn", Value::FnRef(func.into()))]))
    }

    pub fn matches(&self, effect: &Effect) -> bool {
        match self {
            EffectMatcher::Exact(expected) => expected == effect,
            EffectMatcher::Like { kind, payload } => {
                effect.kind() == *kind && is_match(&effect.payload_value(), payload)
            }
            EffectMatcher::Predicate(f) => f(effect),
        }
    }
}

impl From<Effect> for EffectMatcher {
    fn from(effect: Effect) -> Self {
        EffectMatcher::Exact(effect)
    }
}

/// Value produced by a static provider.
pub enum StaticValue {
    Value(Value),
    /// Computed from the actual effect each time it is provided.
    Dynamic(Box<dyn Fn(&Effect) -> Value>),
    Throw(Value),
}

impl StaticValue {
    fn provision(&self, effect: &Effect) -> Provision {
        match self {
            StaticValue::Value(value) => Provision::Stub(value.clone()),
            StaticValue::Dynamic(f) => Provision::Stub(f(effect)),
            StaticValue::Throw(error) => Provision::Fail(error.clone()),
        }
    }
}

/// Stub providers registered for a run.
#[derive(Default)]
pub struct ProviderSet {
    by_kind: BTreeMap<EffectKind, Vec<Box<dyn Provider>>>,
    statics: Vec<(EffectMatcher, StaticValue)>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interceptor for one kind; interceptors run in registration order.
    pub fn on(
        mut self,
        kind: EffectKind,
        provider: impl Fn(&Effect, &dyn Fn() -> Provision) -> Provision + 'static,
    ) -> Self {
        self.by_kind.entry(kind).or_default().push(Box::new(provider));
        self
    }

    /// Stub matching effects with a fixed value.
    pub fn stub(self, matcher: impl Into<EffectMatcher>, value: Value) -> Self {
        self.push_static(matcher.into(), StaticValue::Value(value))
    }

    /// Stub matching effects with a value computed from the effect.
    pub fn dynamic(
        self,
        matcher: impl Into<EffectMatcher>,
        f: impl Fn(&Effect) -> Value + 'static,
    ) -> Self {
        self.push_static(matcher.into(), StaticValue::Dynamic(Box::new(f)))
    }

    /// Make matching effects fail with `error`.
    pub fn throw(self, matcher: impl Into<EffectMatcher>, error: Value) -> Self {
        self.push_static(matcher.into(), StaticValue::Throw(error))
    }

    pub fn push_static(mut self, matcher: EffectMatcher, value: StaticValue) -> Self {
        self.statics.push((matcher, value));
        self
    }

    /// Merge another set's providers after this set's.
    pub fn extend(&mut self, other: ProviderSet) {
        for (kind, providers) in other.by_kind {
            self.by_kind.entry(kind).or_default().extend(providers);
        }
        self.statics.extend(other.statics);
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty() && self.statics.is_empty()
    }

    /// Run `effect` through the chain for its kind.
    pub fn resolve(&self, effect: &Effect) -> Provision {
        let provision = self.build_chain(effect)();
        trace!(effect = %effect.kind(), ?provision, "provider chain resolved");
        provision
    }

    /// Fold the kind's providers, last to first, into one callable whose
    /// innermost `next` consults the static providers.
    fn build_chain<'a>(&'a self, effect: &'a Effect) -> Box<dyn Fn() -> Provision + 'a> {
        let fallback: Box<dyn Fn() -> Provision + 'a> = Box::new(move || self.resolve_static(effect));
        self.by_kind
            .get(&effect.kind())
            .map(|providers| providers.as_slice())
            .unwrap_or(&[])
            .iter()
            .rev()
            .fold(fallback, |next, provider| -> Box<dyn Fn() -> Provision + 'a> {
                Box::new(move || provider.provide(effect, &*next))
            })
    }

    fn resolve_static(&self, effect: &Effect) -> Provision {
        self.statics
            .iter()
            .find(|(matcher, _)| matcher.matches(effect))
            .map(|(_, value)| value.provision(effect))
            .unwrap_or(Provision::Defer)
    }
}
