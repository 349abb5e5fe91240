use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs for one connection attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoreSettings {
    /// How long the plugin may take to reach readiness after `init` before
    /// the attempt is abandoned.
    pub init_timeout: Duration,
    /// Delay between readiness and message polls.
    pub poll_interval: Duration,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            init_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl CoreSettings {
    pub fn new(init_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            init_timeout,
            poll_interval,
        }
    }
}
