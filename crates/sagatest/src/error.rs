use sagaprobe_runtime::RunError;
use sagaprobe_value::Value;
use std::fmt;
use thiserror::Error;

/// A failed expectation with its rendered diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub message: String,
    pub expected: Option<Value>,
    pub actual: Option<Value>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Failure {
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    pub fn with_values(mut self, expected: Value, actual: Value) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Error)]
pub enum ExpectError {
    /// Every failed expectation, in registration order. Displays the first.
    #[error("{}", first_message(.0))]
    Assertion(Vec<Failure>),

    /// The saga threw and no `throws` expectation was registered.
    #[error("saga threw: {0}")]
    Uncaught(Value),

    #[error("run failed: {0}")]
    Run(#[from] RunError),
}

impl ExpectError {
    pub fn failures(&self) -> &[Failure] {
        match self {
            ExpectError::Assertion(failures) => failures,
            _ => &[],
        }
    }

    pub fn first_failure(&self) -> Option<&Failure> {
        self.failures().first()
    }

    /// The error value the saga threw, when that is why the run failed.
    pub fn uncaught(&self) -> Option<&Value> {
        match self {
            ExpectError::Uncaught(error) => Some(error),
            _ => None,
        }
    }
}

fn first_message(failures: &[Failure]) -> &str {
    failures.first().map(|f| f.message.as_str()).unwrap_or_default()
}
