use sagaprobe_effect::Effect;
use sagaprobe_value::Value;
use std::collections::VecDeque;

/// Input handed to a suspended computation.
#[derive(Debug, Clone, PartialEq)]
pub enum Resume {
    /// First step, nothing to resume with.
    Start,
    /// Result of the last yielded effect.
    Value(Value),
    /// Error injected at the last yield point.
    Throw(Value),
}

/// What a computation does next.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Effect(Effect),
    Return(Value),
    Throw(Value),
}

/// The stepper contract: advance the computation with an input and get back
/// its next effect or its terminal result. Called repeatedly until terminal.
pub trait Computation {
    fn resume(&mut self, input: Resume) -> Step;
}

impl<F> Computation for F
where
    F: FnMut(Resume) -> Step,
{
    fn resume(&mut self, input: Resume) -> Step {
        self(input)
    }
}

type StepFn = Box<dyn FnMut(&[Value]) -> Step>;
type CatchFn = Box<dyn FnMut(Value, &[Value]) -> Step>;

/// A computation written as an ordered list of steps.
///
/// Each step sees every value the computation has been resumed with so far
/// and decides the next effect or terminal result. An injected error jumps
/// to the `catching` handler when one is installed; otherwise it escapes as
/// the computation's own throw.
///
/// ```ignore
/// let saga = Script::new()
///     .effect(call("fetchUser", vec![Value::Int(1)]))
///     .then(|r| Step::Effect(put(r[0].clone())))
///     .ret(Value::Null);
/// ```
#[derive(Default)]
pub struct Script {
    steps: VecDeque<StepFn>,
    received: Vec<Value>,
    on_error: Option<CatchFn>,
    finished: bool,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yield a fixed effect.
    pub fn effect(self, effect: Effect) -> Self {
        self.then(move |_| Step::Effect(effect.clone()))
    }

    /// Compute the next step from the values received so far.
    pub fn then(mut self, step: impl FnMut(&[Value]) -> Step + 'static) -> Self {
        self.steps.push_back(Box::new(step));
        self
    }

    pub fn ret(self, value: Value) -> Self {
        self.then(move |_| Step::Return(value.clone()))
    }

    pub fn throw(self, error: Value) -> Self {
        self.then(move |_| Step::Throw(error.clone()))
    }

    /// Handle an error injected at any yield point. Remaining steps are dropped.
    pub fn catching(mut self, handler: impl FnMut(Value, &[Value]) -> Step + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    pub fn boxed(self) -> Box<dyn Computation> {
        Box::new(self)
    }

    fn next_step(&mut self) -> Step {
        match self.steps.pop_front() {
            Some(mut step) => {
                let next = step(&self.received);
                self.settle(next)
            }
            None => self.settle(Step::Return(Value::Undefined)),
        }
    }

    fn settle(&mut self, step: Step) -> Step {
        if !matches!(step, Step::Effect(_)) {
            self.finished = true;
        }
        step
    }
}

impl Computation for Script {
    fn resume(&mut self, input: Resume) -> Step {
        if self.finished {
            return Step::Return(Value::Undefined);
        }
        match input {
            Resume::Start => self.next_step(),
            Resume::Value(value) => {
                self.received.push(value);
                self.next_step()
            }
            Resume::Throw(error) => match self.on_error.take() {
                Some(mut handler) => {
                    self.steps.clear();
                    let step = handler(error, &self.received);
                    self.settle(step)
                }
                None => self.settle(Step::Throw(error)),
            },
        }
    }
}
