use sagaprobe_value::Value;

/// Folds dispatched actions into derived state.
pub trait Reducer {
    fn reduce(&self, state: &Value, action: &Value) -> Value;
}

impl<F> Reducer for F
where
    F: Fn(&Value, &Value) -> Value,
{
    fn reduce(&self, state: &Value, action: &Value) -> Value {
        self(state, action)
    }
}

/// Final state after feeding `log` through `reducer` in dispatch order.
pub fn derive_state(reducer: &dyn Reducer, initial: &Value, log: &[Value]) -> Value {
    log.iter()
        .fold(initial.clone(), |state, action| reducer.reduce(&state, action))
}
