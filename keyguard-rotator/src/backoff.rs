//! Backoff applied after failed scheduler cycles
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use keyguard_config::SchedulerConfig;
use std::time::Duration;

/// Backoff configuration for loop-level failures
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay after the first failed cycle, in seconds
    pub initial_delay_secs: u64,
    /// Maximum delay in seconds (cap for exponential backoff)
    pub max_delay_secs: u64,
    /// Multiplier for exponential backoff (e.g., 2.0 for doubling)
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: 300,
            max_delay_secs: 3600,
            multiplier: 2.0,
        }
    }
}

impl BackoffConfig {
    pub fn new(initial_delay_secs: u64, max_delay_secs: u64, multiplier: f64) -> Self {
        Self {
            initial_delay_secs,
            max_delay_secs,
            multiplier,
        }
    }

    /// Delay after `consecutive_failures` failed cycles in a row
    pub fn delay_for_attempt(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::from_secs(0);
        }

        // initial_delay * (multiplier ^ (failures - 1)), capped
        let exponent = i32::try_from(consecutive_failures - 1).unwrap_or(i32::MAX);
        let delay_secs = (self.initial_delay_secs as f64) * self.multiplier.powi(exponent);
        let delay_secs = delay_secs.min(self.max_delay_secs as f64) as u64;

        Duration::from_secs(delay_secs)
    }
}

impl From<&SchedulerConfig> for BackoffConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self::new(
            config.error_backoff_secs,
            config.error_backoff_max_secs,
            config.error_backoff_multiplier,
        )
    }
}
