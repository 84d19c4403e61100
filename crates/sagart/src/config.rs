use serde::{Deserialize, Serialize};

use crate::error::RunError;

/// Run driver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum number of computation steps across all tasks.
    pub max_steps: u64,
    /// Keep running forked tasks after the root has finished.
    pub drain_forks: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            max_steps: 10_000,
            drain_forks: true,
        }
    }
}

impl RunConfig {
    pub fn from_json(json: &str) -> Result<Self, RunError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_drain_forks(mut self, drain_forks: bool) -> Self {
        self.drain_forks = drain_forks;
        self
    }
}
