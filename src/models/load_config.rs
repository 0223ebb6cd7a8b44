use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Shape of one load run.
///
/// `duration` wins over `iterations` when both are set.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadConfig {
    pub virtual_users: usize,
    pub duration: Duration,
    pub iterations: u64,
    pub ramp_up: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Duration(Duration),
    Iterations(u64),
}

impl LoadConfig {
    pub fn for_duration(virtual_users: usize, duration: Duration) -> Self {
        LoadConfig {
            virtual_users,
            duration,
            ..Default::default()
        }
    }

    pub fn for_iterations(virtual_users: usize, iterations: u64) -> Self {
        LoadConfig {
            virtual_users,
            iterations,
            ..Default::default()
        }
    }

    pub fn with_ramp_up(mut self, ramp_up: Duration) -> Self {
        self.ramp_up = ramp_up;
        self
    }

    pub fn termination(&self) -> Option<Termination> {
        if !self.duration.is_zero() {
            Some(Termination::Duration(self.duration))
        } else if self.iterations > 0 {
            Some(Termination::Iterations(self.iterations))
        } else {
            None
        }
    }
}
