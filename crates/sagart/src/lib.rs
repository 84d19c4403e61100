pub mod computation;
pub mod config;
pub mod driver;
pub mod error;
pub mod host;
pub mod pattern;
pub mod provider;
pub mod reducer;
pub mod store;

pub use computation::{Computation, Resume, Script, Step};
pub use config::RunConfig;
pub use driver::{RunDriver, RunRecord, TerminalOutcome};
pub use error::RunError;
pub use host::{HostFunctions, HostResult, Invocation};
pub use pattern::matches_action;
pub use provider::{EffectMatcher, Provider, ProviderSet, Provision, StaticValue};
pub use reducer::{derive_state, Reducer};
pub use store::{EffectStore, MultisetStore};
