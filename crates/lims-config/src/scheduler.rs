//! Background scheduler configuration.

use serde::{Deserialize, Serialize};

/// Minute 0 of every third hour, UTC.
pub const DEFAULT_DEADLINE_CRON: &str = "0 */3 * * *";

fn default_deadline_cron() -> String {
    DEFAULT_DEADLINE_CRON.to_string()
}

const fn default_poll_interval_secs() -> u64 {
    60
}

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Cron expression for the deadline job. Five-field (minute-first) or
    /// six-field (seconds-first) syntax.
    #[serde(default = "default_deadline_cron")]
    pub deadline_cron: String,

    /// How often the loop wakes up to look for due jobs.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            deadline_cron: default_deadline_cron(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}
