use sagaprobe_effect::{serialize_effect, Branches, CallDescriptor, Effect, TakeSource};
use sagaprobe_value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};

use crate::computation::{Computation, Resume, Step};
use crate::config::RunConfig;
use crate::error::RunError;
use crate::host::{missing_function, HostFunctions, HostResult, Invocation};
use crate::pattern::matches_action;
use crate::provider::{ProviderSet, Provision};
use crate::reducer::Reducer;
use crate::store::EffectStore;

const ROOT: usize = 0;

/// How the root computation ended. Set once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TerminalOutcome {
    Returned(Value),
    Threw(Value),
}

impl TerminalOutcome {
    pub fn return_value(&self) -> Option<&Value> {
        match self {
            TerminalOutcome::Returned(value) => Some(value),
            TerminalOutcome::Threw(_) => None,
        }
    }

    pub fn error_value(&self) -> Option<&Value> {
        match self {
            TerminalOutcome::Threw(error) => Some(error),
            TerminalOutcome::Returned(_) => None,
        }
    }
}

/// Everything observed during one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub outcome: TerminalOutcome,
    /// State after reducing every dispatched action, in dispatch order.
    pub final_state: Value,
    pub dispatch_log: Vec<Value>,
    /// Observed effects by kind; expectations consume entries from it.
    pub store: EffectStore,
    /// Every observed effect in yield order.
    pub effect_log: Vec<Effect>,
    pub steps: u64,
}

/// Drives a root computation to completion, stubbing effects through the
/// provider chain and performing the rest with built-in default handling.
///
/// Tasks are scheduled cooperatively from a single run queue. Effects that
/// resolve immediately resume their task right away; tasks started by an
/// effect run before the task that started them continues.
pub struct RunDriver {
    providers: ProviderSet,
    host: HostFunctions,
    reducer: Option<Box<dyn Reducer>>,
    initial_state: Value,
    context: BTreeMap<String, Value>,
    dispatches: Vec<Value>,
    config: RunConfig,
}

impl Default for RunDriver {
    fn default() -> Self {
        Self::new(ProviderSet::new(), HostFunctions::new())
    }
}

impl RunDriver {
    pub fn new(providers: ProviderSet, host: HostFunctions) -> Self {
        RunDriver {
            providers,
            host,
            reducer: None,
            initial_state: Value::Undefined,
            context: BTreeMap::new(),
            dispatches: Vec::new(),
            config: RunConfig::default(),
        }
    }

    pub fn with_reducer(mut self, reducer: impl Reducer + 'static) -> Self {
        self.reducer = Some(Box::new(reducer));
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.initial_state = state;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Queue an action to dispatch once no task can make progress.
    pub fn dispatch(mut self, action: Value) -> Self {
        self.dispatches.push(action);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn run(&self, root: Box<dyn Computation>) -> Result<RunRecord, RunError> {
        let mut run = Run::new(self);
        let root = run.spawn_task(root, None, false);
        run.ready.push_back(root);
        run.drive()?;
        Ok(run.into_record())
    }
}

enum TaskStatus {
    Ready,
    Waiting(Wait),
    Done(HostResult),
}

enum Wait {
    Take(Value),
    Channel(usize),
    Join(usize),
    /// Caller of a saga-valued `call`, waiting for the child.
    Call(usize),
    /// Parent of a `race`/`all`, waiting on its branches.
    Combinator(usize),
}

enum Disposition {
    Resume(Resume),
    Block(Wait),
}

struct Task {
    computation: Box<dyn Computation>,
    status: TaskStatus,
    input: Resume,
    parent: Option<usize>,
    detached: bool,
    cancelled: bool,
    /// Combinator slot and branch index when this task runs a branch.
    branch: Option<(usize, usize)>,
}

/// A `race` or `all` whose branches run as child tasks of `parent`.
struct Combinator {
    parent: usize,
    race: bool,
    keys: Option<Vec<String>>,
    branches: Vec<usize>,
    results: Vec<Option<Value>>,
    settled: bool,
}

impl Combinator {
    /// Race result: the winner's value in its slot, nothing elsewhere.
    fn race_result(&self, index: usize, value: Value) -> Value {
        match &self.keys {
            Some(keys) => Value::map([(keys[index].clone(), value)]),
            None => {
                let mut results = vec![Value::Undefined; self.branches.len()];
                results[index] = value;
                Value::List(results)
            }
        }
    }

    fn all_result(&self) -> Value {
        let values = self.results.iter().map(|r| r.clone().unwrap_or_default());
        match &self.keys {
            Some(keys) => Value::Map(keys.iter().cloned().zip(values).collect()),
            None => Value::List(values.collect()),
        }
    }
}

/// Runs one combinator branch: yields the branch effect, then returns
/// whatever it resolved to.
struct BranchStep(Option<Effect>);

impl Computation for BranchStep {
    fn resume(&mut self, input: Resume) -> Step {
        match input {
            Resume::Start => match self.0.take() {
                Some(effect) => Step::Effect(effect),
                None => Step::Return(Value::Undefined),
            },
            Resume::Value(value) => Step::Return(value),
            Resume::Throw(error) => Step::Throw(error),
        }
    }
}

struct Channel {
    pattern: Value,
    buffer: VecDeque<Value>,
}

struct Run<'d> {
    driver: &'d RunDriver,
    tasks: Vec<Task>,
    ready: VecDeque<usize>,
    channels: Vec<Channel>,
    combinators: Vec<Combinator>,
    context: BTreeMap<String, Value>,
    state: Value,
    pending: VecDeque<Value>,
    dispatch_log: Vec<Value>,
    store: EffectStore,
    effect_log: Vec<Effect>,
    outcome: Option<TerminalOutcome>,
    steps: u64,
}

impl<'d> Run<'d> {
    fn new(driver: &'d RunDriver) -> Self {
        Run {
            driver,
            tasks: Vec::new(),
            ready: VecDeque::new(),
            channels: Vec::new(),
            combinators: Vec::new(),
            context: driver.context.clone(),
            state: driver.initial_state.clone(),
            pending: driver.dispatches.iter().cloned().collect(),
            dispatch_log: Vec::new(),
            store: EffectStore::new(),
            effect_log: Vec::new(),
            outcome: None,
            steps: 0,
        }
    }

    fn drive(&mut self) -> Result<(), RunError> {
        let driver = self.driver;
        let config = &driver.config;
        loop {
            let root_done = self.outcome.is_some();
            if root_done && !config.drain_forks {
                break;
            }

            let Some(id) = self.ready.pop_front() else {
                // Nothing runnable: hand queued actions to blocked takers.
                if let Some(action) = self.pending.pop_front() {
                    debug!(action = %action, "dispatching queued action");
                    self.dispatch(&action);
                    continue;
                }
                break;
            };

            if self.steps >= config.max_steps {
                if root_done {
                    warn!(steps = self.steps, "step limit reached after the root finished, stopping forked tasks");
                    break;
                }
                return Err(RunError::StepLimitExceeded(config.max_steps));
            }
            self.steps += 1;
            self.step(id);
        }

        if self.outcome.is_none() {
            warn!("root saga is still blocked with nothing left to run, cancelling it");
            self.cancel_task(ROOT);
            self.outcome = Some(TerminalOutcome::Returned(Value::Undefined));
        }
        Ok(())
    }

    fn step(&mut self, id: usize) {
        let task = &mut self.tasks[id];
        if !matches!(task.status, TaskStatus::Ready) {
            return;
        }
        let input = std::mem::replace(&mut task.input, Resume::Start);
        match task.computation.resume(input) {
            Step::Return(value) => self.finish(id, Ok(value)),
            Step::Throw(error) => self.finish(id, Err(error)),
            Step::Effect(effect) => {
                let first_child = self.tasks.len();
                match self.handle(id, &effect) {
                    Disposition::Resume(input) => {
                        self.tasks[id].input = input;
                        self.ready.push_front(id);
                    }
                    Disposition::Block(wait) => self.tasks[id].status = TaskStatus::Waiting(wait),
                }
                let spawned: Vec<usize> = (first_child..self.tasks.len())
                    .filter(|&child| matches!(self.tasks[child].status, TaskStatus::Ready))
                    .collect();
                // Branch tasks may already be queued by their first step.
                self.ready.retain(|queued| !spawned.contains(queued));
                for child in spawned.into_iter().rev() {
                    self.ready.push_front(child);
                }
            }
        }
    }

    /// Record an effect, then stub it or perform it.
    fn handle(&mut self, id: usize, effect: &Effect) -> Disposition {
        self.record(effect);
        match self.driver.providers.resolve(effect) {
            Provision::Stub(value) => Disposition::Resume(Resume::Value(value)),
            Provision::Fail(error) => Disposition::Resume(Resume::Throw(error)),
            Provision::Defer => self.perform(id, effect),
        }
    }

    fn record(&mut self, effect: &Effect) {
        debug!(effect = %serialize_effect(effect), "effect yielded");
        if let Effect::Put {
            channel: None,
            action,
            ..
        } = effect
        {
            self.dispatch_log.push(action.clone());
            self.reduce(action);
        }
        self.store.add(effect.clone());
        self.effect_log.push(effect.clone());
    }

    fn perform(&mut self, id: usize, effect: &Effect) -> Disposition {
        let driver = self.driver;
        let host = &driver.host;
        let resume = match effect {
            Effect::Put {
                channel: None,
                action,
                ..
            } => {
                self.wake_takers(action);
                Resume::Value(action.clone())
            }
            Effect::Put {
                channel: Some(channel),
                action,
                ..
            } => match self.channel_id(channel) {
                Ok(ch) => {
                    self.deliver_to_channel(ch, action.clone());
                    Resume::Value(action.clone())
                }
                Err(error) => Resume::Throw(error),
            },
            Effect::Call(call) | Effect::Cps(call) => match host.invoke(&call.func, &call.args) {
                Invocation::Value(result) => into_resume(result),
                Invocation::Saga(computation) => {
                    let child = self.spawn_task(computation, Some(id), false);
                    return Disposition::Block(Wait::Call(child));
                }
                Invocation::Missing => Resume::Throw(missing_function(&call.func)),
            },
            Effect::Fork { call, detached } => {
                let child = self.fork(id, call, *detached);
                Resume::Value(Value::task(child as u64))
            }
            Effect::Take {
                source: TakeSource::Pattern(pattern),
                ..
            } => return Disposition::Block(Wait::Take(pattern.clone())),
            Effect::Take {
                source: TakeSource::Channel(channel),
                ..
            } => match self.channel_id(channel) {
                Ok(ch) => match self.channels[ch].buffer.pop_front() {
                    Some(message) => Resume::Value(message),
                    None => return Disposition::Block(Wait::Channel(ch)),
                },
                Err(error) => Resume::Throw(error),
            },
            Effect::Race(branches) => return self.combinator(id, true, branches),
            Effect::All(branches) => return self.combinator(id, false, branches),
            Effect::Select { selector, args } => {
                let mut call_args = Vec::with_capacity(args.len() + 1);
                call_args.push(self.state.clone());
                call_args.extend(args.iter().cloned());
                into_resume(host.call_plain(selector, &call_args))
            }
            Effect::ActionChannel { pattern, buffer: _ } => {
                self.channels.push(Channel {
                    pattern: pattern.clone(),
                    buffer: VecDeque::new(),
                });
                Resume::Value(Value::channel((self.channels.len() - 1) as u64))
            }
            Effect::Flush(channel) => match self.channel_id(channel) {
                Ok(ch) => Resume::Value(Value::List(self.channels[ch].buffer.drain(..).collect())),
                Err(error) => Resume::Throw(error),
            },
            Effect::GetContext(key) => {
                Resume::Value(self.context.get(key).cloned().unwrap_or_default())
            }
            Effect::SetContext(props) => {
                self.context
                    .extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
                Resume::Value(Value::Undefined)
            }
            Effect::Join(task) => match self.task_id(task) {
                Ok(target) => match &self.tasks[target].status {
                    TaskStatus::Done(result) => into_resume(result.clone()),
                    _ => return Disposition::Block(Wait::Join(target)),
                },
                Err(error) => Resume::Throw(error),
            },
            Effect::Cancel(task) => match self.task_id(task) {
                Ok(target) => {
                    self.cancel_task(target);
                    Resume::Value(Value::Undefined)
                }
                Err(error) => Resume::Throw(error),
            },
            // Cancelled tasks are never resumed, so a task asking is still running.
            Effect::Cancelled => Resume::Value(Value::Bool(self.tasks[id].cancelled)),
            Effect::Unknown { kind, .. } => {
                warn!(kind = %kind, "no default handling for effect kind, resuming with undefined");
                Resume::Value(Value::Undefined)
            }
        };
        Disposition::Resume(resume)
    }

    fn fork(&mut self, parent: usize, call: &CallDescriptor, detached: bool) -> usize {
        let result = match self.driver.host.invoke(&call.func, &call.args) {
            Invocation::Saga(computation) => {
                return self.spawn_task(computation, Some(parent), detached);
            }
            Invocation::Value(result) => result,
            Invocation::Missing => Err(missing_function(&call.func)),
        };
        let child = self.spawn_task(
            Box::new(|_: Resume| Step::Return(Value::Undefined)),
            Some(parent),
            detached,
        );
        self.finish(child, result);
        child
    }

    /// Start every branch as a child task and park the parent until the
    /// combinator settles. Each branch yields its effect before any branch
    /// can finish, so every branch effect is recorded.
    fn combinator(&mut self, id: usize, race: bool, branches: &Branches) -> Disposition {
        let (keys, effects): (Option<Vec<String>>, Vec<Effect>) = match branches {
            Branches::List(effects) => (None, effects.clone()),
            Branches::Keyed(effects) => (
                Some(effects.keys().cloned().collect()),
                effects.values().cloned().collect(),
            ),
        };
        if effects.is_empty() {
            let empty = match keys {
                Some(_) => Value::Map(BTreeMap::new()),
                None => Value::List(Vec::new()),
            };
            return Disposition::Resume(Resume::Value(empty));
        }

        let slot = self.combinators.len();
        let mut children = Vec::with_capacity(effects.len());
        for (index, effect) in effects.into_iter().enumerate() {
            let child = self.spawn_task(Box::new(BranchStep(Some(effect))), Some(id), false);
            self.tasks[child].branch = Some((slot, index));
            children.push(child);
        }
        self.combinators.push(Combinator {
            parent: id,
            race,
            keys,
            branches: children.clone(),
            results: vec![None; children.len()],
            settled: false,
        });
        for child in children {
            self.step(child);
        }
        Disposition::Block(Wait::Combinator(slot))
    }

    /// A branch finished. A race settles on its first branch; an `all` once
    /// every branch has a value. Any branch error settles both. Branches
    /// still running are cancelled.
    fn settle_branch(&mut self, slot: usize, index: usize, result: HostResult) {
        let combinator = &mut self.combinators[slot];
        if combinator.settled {
            return;
        }
        let input = match result {
            Err(error) => Resume::Throw(error),
            Ok(value) if combinator.race => Resume::Value(combinator.race_result(index, value)),
            Ok(value) => {
                combinator.results[index] = Some(value);
                if combinator.results.iter().any(Option::is_none) {
                    return;
                }
                Resume::Value(combinator.all_result())
            }
        };
        combinator.settled = true;
        let parent = combinator.parent;
        let branches = combinator.branches.clone();

        for branch in branches {
            self.cancel_task(branch);
        }
        if matches!(self.tasks[parent].status, TaskStatus::Waiting(Wait::Combinator(s)) if s == slot) {
            self.wake(parent, input, true);
        }
    }

    fn spawn_task(
        &mut self,
        computation: Box<dyn Computation>,
        parent: Option<usize>,
        detached: bool,
    ) -> usize {
        let id = self.tasks.len();
        debug!(task = id, ?parent, detached, "task started");
        self.tasks.push(Task {
            computation,
            status: TaskStatus::Ready,
            input: Resume::Start,
            parent,
            detached,
            cancelled: false,
            branch: None,
        });
        id
    }

    fn finish(&mut self, id: usize, result: HostResult) {
        if let Some((slot, index)) = self.tasks[id].branch {
            self.tasks[id].status = TaskStatus::Done(result.clone());
            self.settle_branch(slot, index, result);
            return;
        }

        let waiters: Vec<(usize, bool)> = self
            .tasks
            .iter()
            .enumerate()
            .filter_map(|(waiter, task)| match task.status {
                TaskStatus::Waiting(Wait::Call(child)) if child == id => Some((waiter, true)),
                TaskStatus::Waiting(Wait::Join(child)) if child == id => Some((waiter, false)),
                _ => None,
            })
            .collect();

        if id == ROOT {
            let outcome = match &result {
                Ok(value) => TerminalOutcome::Returned(value.clone()),
                Err(error) => TerminalOutcome::Threw(error.clone()),
            };
            debug!(?outcome, "root saga finished");
            self.outcome.get_or_insert(outcome);
        } else if let Err(error) = &result {
            if waiters.is_empty() {
                warn!(task = id, error = %error, "forked task threw, the run outcome is unaffected");
            }
        }

        self.tasks[id].status = TaskStatus::Done(result.clone());
        for (waiter, is_call) in waiters {
            self.wake(waiter, into_resume(result.clone()), is_call);
        }
    }

    /// Cancel a task and its attached descendants. Joiners resume with undefined.
    fn cancel_task(&mut self, id: usize) {
        if matches!(self.tasks[id].status, TaskStatus::Done(_)) {
            return;
        }
        debug!(task = id, "task cancelled");
        self.tasks[id].cancelled = true;
        self.tasks[id].status = TaskStatus::Done(Ok(Value::Undefined));
        self.ready.retain(|&queued| queued != id);

        let children: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.parent == Some(id) && !task.detached)
            .map(|(child, _)| child)
            .collect();
        for child in children {
            self.cancel_task(child);
        }

        let joiners: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| {
                matches!(task.status,
                    TaskStatus::Waiting(Wait::Join(t)) | TaskStatus::Waiting(Wait::Call(t)) if t == id)
            })
            .map(|(joiner, _)| joiner)
            .collect();
        for joiner in joiners {
            self.wake(joiner, Resume::Value(Value::Undefined), false);
        }
    }

    fn wake(&mut self, id: usize, input: Resume, front: bool) {
        let task = &mut self.tasks[id];
        task.status = TaskStatus::Ready;
        task.input = input;
        if front {
            self.ready.push_front(id);
        } else {
            self.ready.push_back(id);
        }
    }

    /// An action dispatched from outside the computation.
    fn dispatch(&mut self, action: &Value) {
        self.dispatch_log.push(action.clone());
        self.reduce(action);
        self.wake_takers(action);
    }

    fn reduce(&mut self, action: &Value) {
        if let Some(reducer) = &self.driver.reducer {
            self.state = reducer.reduce(&self.state, action);
        }
    }

    fn wake_takers(&mut self, action: &Value) {
        let driver = self.driver;
        let host = &driver.host;
        let takers: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| {
                matches!(&task.status, TaskStatus::Waiting(Wait::Take(pattern))
                    if matches_action(pattern, action, host))
            })
            .map(|(taker, _)| taker)
            .collect();
        for taker in takers {
            self.wake(taker, Resume::Value(action.clone()), false);
        }

        let channels: Vec<usize> = self
            .channels
            .iter()
            .enumerate()
            .filter(|(_, channel)| matches_action(&channel.pattern, action, host))
            .map(|(ch, _)| ch)
            .collect();
        for ch in channels {
            self.deliver_to_channel(ch, action.clone());
        }
    }

    /// Hand a message to the first task waiting on the channel, or buffer it.
    fn deliver_to_channel(&mut self, ch: usize, message: Value) {
        let waiting = self
            .tasks
            .iter()
            .position(|task| matches!(task.status, TaskStatus::Waiting(Wait::Channel(c)) if c == ch));
        match waiting {
            Some(taker) => self.wake(taker, Resume::Value(message), false),
            None => self.channels[ch].buffer.push_back(message),
        }
    }

    fn task_id(&self, handle: &Value) -> Result<usize, Value> {
        handle
            .handle_id("task")
            .map(|id| id as usize)
            .filter(|&id| id < self.tasks.len())
            .ok_or_else(|| Value::error("TypeError", format!("{handle} is not a task")))
    }

    fn channel_id(&self, handle: &Value) -> Result<usize, Value> {
        handle
            .handle_id("channel")
            .map(|id| id as usize)
            .filter(|&id| id < self.channels.len())
            .ok_or_else(|| Value::error("TypeError", format!("{handle} is not a channel")))
    }

    fn into_record(self) -> RunRecord {
        RunRecord {
            outcome: self
                .outcome
                .unwrap_or(TerminalOutcome::Returned(Value::Undefined)),
            final_state: self.state,
            dispatch_log: self.dispatch_log,
            store: self.store,
            effect_log: self.effect_log,
            steps: self.steps,
        }
    }
}

fn into_resume(result: HostResult) -> Resume {
    match result {
        Ok(value) => Resume::Value(value),
        Err(error) => Resume::Throw(error),
    }
}
