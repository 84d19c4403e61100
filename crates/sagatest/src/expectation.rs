use sagaprobe_effect::{serialize_effect, Effect, EffectKind};
use sagaprobe_runtime::RunRecord;
use sagaprobe_value::{is_match, Value};
use tracing::debug;

use crate::diagnostics::{Diagnostics, PlainDiagnostics};
use crate::error::Failure;
use crate::report::report_actual_effects;

/// Which stored effect an occurrence expectation consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectPattern {
    /// Deep equality with a stored effect.
    Exact(Effect),
    /// A stored effect of `kind` whose payload partially matches.
    Like { kind: EffectKind, payload: Value },
}

impl EffectPattern {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectPattern::Exact(effect) => effect.kind(),
            EffectPattern::Like { kind, .. } => *kind,
        }
    }

    fn describe(&self) -> String {
        match self {
            EffectPattern::Exact(effect) => serialize_effect(effect),
            EffectPattern::Like { payload, .. } => format!("like {}", payload.inspect()),
        }
    }

    fn expected_value(&self) -> Value {
        match self {
            EffectPattern::Exact(effect) => effect.to_value(),
            EffectPattern::Like { payload, .. } => Value::map([("payload", payload.clone())]),
        }
    }
}

/// How a thrown error is recognized.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorMatcher {
    /// An instance of the named class.
    Type(String),
    /// Deep equality with the thrown value.
    Value(Value),
}

impl ErrorMatcher {
    pub fn matches(&self, error: &Value) -> bool {
        match self {
            ErrorMatcher::Type(class) => error.is_instance_of(class),
            ErrorMatcher::Value(value) => value == error,
        }
    }

    fn describe(&self) -> String {
        match self {
            ErrorMatcher::Type(class) => class.clone(),
            ErrorMatcher::Value(value) => value.inspect(),
        }
    }
}

/// A deferred assertion over a finished run. `expected: false` negates it.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    Occurrence {
        /// Helper name shown in messages (`put`, `apply`, ...).
        name: String,
        pattern: EffectPattern,
        expected: bool,
    },
    Return { value: Value, expected: bool },
    State { state: Value, expected: bool },
    Throw { matcher: ErrorMatcher, expected: bool },
}

impl Expectation {
    pub fn occurrence(effect: Effect, expected: bool) -> Self {
        Expectation::Occurrence {
            name: effect.constructor_name().to_string(),
            pattern: EffectPattern::Exact(effect),
            expected,
        }
    }

    pub fn like(kind: EffectKind, payload: Value, expected: bool) -> Self {
        Expectation::Occurrence {
            name: kind.name().to_string(),
            pattern: EffectPattern::Like { kind, payload },
            expected,
        }
    }

    /// Rename the effect in messages, e.g. `apply` for a call with context.
    pub fn named(mut self, new_name: impl Into<String>) -> Self {
        if let Expectation::Occurrence { name, .. } = &mut self {
            *name = new_name.into();
        }
        self
    }

    /// Any `throws` expectation, negated or not, takes ownership of the
    /// saga's error.
    pub fn expects_throw(&self) -> bool {
        matches!(self, Expectation::Throw { .. })
    }
}

/// Evaluates expectations against a run record and renders failures.
pub struct ExpectationEngine {
    diagnostics: Box<dyn Diagnostics>,
}

impl Default for ExpectationEngine {
    fn default() -> Self {
        Self::new(Box::new(PlainDiagnostics))
    }
}

impl ExpectationEngine {
    pub fn new(diagnostics: Box<dyn Diagnostics>) -> Self {
        ExpectationEngine { diagnostics }
    }

    /// Check each expectation in order. Occurrence checks consume the stored
    /// effect they match, so repeating one asserts a second occurrence.
    pub fn evaluate(&self, expectations: &[Expectation], record: &mut RunRecord) -> Vec<Failure> {
        let failures: Vec<Failure> = expectations
            .iter()
            .filter_map(|expectation| self.check(expectation, record))
            .collect();
        debug!(
            expectations = expectations.len(),
            failures = failures.len(),
            "expectations evaluated"
        );
        failures
    }

    pub fn check(&self, expectation: &Expectation, record: &mut RunRecord) -> Option<Failure> {
        match expectation {
            Expectation::Occurrence {
                name,
                pattern,
                expected,
            } => self.check_occurrence(name, pattern, *expected, record),
            Expectation::Return { value, expected } => {
                let returned = record.outcome.return_value().cloned().unwrap_or_default();
                self.check_return(value, &returned, *expected)
            }
            Expectation::State { state, expected } => {
                self.check_state(state, &record.final_state, *expected)
            }
            Expectation::Throw { matcher, expected } => {
                self.check_throw(matcher, record.outcome.error_value(), *expected)
            }
        }
    }

    fn check_occurrence(
        &self,
        name: &str,
        pattern: &EffectPattern,
        expected: bool,
        record: &mut RunRecord,
    ) -> Option<Failure> {
        let d = &self.diagnostics;
        let deleted = match pattern {
            EffectPattern::Exact(effect) => record.store.delete(effect),
            EffectPattern::Like { kind, payload } => record
                .store
                .delete_by(*kind, |effect| is_match(&effect.payload_value(), payload)),
        };
        let described = pattern.describe();

        if deleted && !expected {
            return Some(Failure::new(format!(
                "Expected {name} effect not to happen, but it did.\n\n{}",
                d.received(&format!("Received: {described}"))
            )));
        }

        if !deleted && expected {
            let remaining = record.store.values(pattern.kind());
            let actual = report_actual_effects(remaining);
            let mut message = format!("Expected {name} effect to happen, but it never did.\n");
            if !actual.is_empty() {
                message.push('\n');
                message.push_str(&d.expected(&format!("Actual effects: \n\n{actual}")));
                message.push('\n');
            }
            message.push('\n');
            message.push_str(&d.received(&format!("Received: {described}")));

            let actual_values = Value::List(remaining.iter().map(Effect::to_value).collect());
            return Some(Failure::new(message).with_values(pattern.expected_value(), actual_values));
        }

        None
    }

    fn check_return(&self, value: &Value, returned: &Value, expected: bool) -> Option<Failure> {
        let d = &self.diagnostics;
        if expected && value != returned {
            let message = format!(
                "{}\n\n{}",
                d.dim("Expected the saga to return given value."),
                d.diff(value, returned)
            );
            return Some(Failure::new(message).with_values(value.clone(), returned.clone()));
        }
        if !expected && value == returned {
            let message = format!(
                "{}\n\nBut it returned the exact value:\n  {}",
                d.dim("Expected the saga not to return given value."),
                d.print_received(returned)
            );
            return Some(Failure::new(message).with_values(value.clone(), returned.clone()));
        }
        None
    }

    fn check_state(&self, state: &Value, final_state: &Value, expected: bool) -> Option<Failure> {
        let d = &self.diagnostics;
        if expected && state != final_state {
            let message = format!(
                "{}\n\n{}",
                d.dim("Expected saga to have final store state."),
                d.diff(state, final_state)
            );
            return Some(Failure::new(message).with_values(state.clone(), final_state.clone()));
        }
        if !expected && state == final_state {
            let message = format!(
                "{}\n\nBut it has the exact value:\n  {}",
                d.dim("Expected saga not to have final store state."),
                d.print_received(final_state)
            );
            return Some(Failure::new(message).with_values(state.clone(), final_state.clone()));
        }
        None
    }

    fn check_throw(
        &self,
        matcher: &ErrorMatcher,
        error: Option<&Value>,
        expected: bool,
    ) -> Option<Failure> {
        let d = &self.diagnostics;
        let described = matcher.describe();

        if !expected {
            return match error {
                Some(error) if matcher.matches(error) => Some(Failure::new(format!(
                    "{}\n\nBut it has thrown:\n  {}",
                    d.dim("Expected saga not to throw."),
                    d.received(&described)
                ))),
                _ => None,
            };
        }

        let Some(error) = error else {
            return Some(Failure::new(format!(
                "{}\n\nExpected to throw:\n  {}\nBut no error has thrown.",
                d.dim("Expected saga to throw."),
                d.received(&described)
            )));
        };

        if matcher.matches(error) {
            return None;
        }

        let failure = match matcher {
            ErrorMatcher::Value(value) => Failure::new(format!(
                "{}\n\n{}",
                d.dim("Expected saga to throw."),
                d.diff(value, error)
            ))
            .with_values(value.clone(), error.clone()),
            ErrorMatcher::Type(class) => Failure::new(format!(
                "{}\n\nExpected to throw: {}\nBut instead threw: {}",
                d.dim("Expected saga to throw error of type."),
                d.expected(class),
                d.received(error.class_name())
            )),
        };
        Some(failure)
    }
}
