//! Project deadline configuration.

use serde::{Deserialize, Serialize};

const fn default_warn_days() -> u32 {
    7
}

fn default_actor() -> String {
    "deadline-job".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeadlinesConfig {
    /// Days before the deadline at which the warning date is placed when a
    /// project is given a deadline without an explicit warning date.
    #[serde(default = "default_warn_days")]
    pub default_warn_days: u32,

    /// Actor recorded on audit entries written by the deadline job.
    #[serde(default = "default_actor")]
    pub actor: String,
}

impl Default for DeadlinesConfig {
    fn default() -> Self {
        Self {
            default_warn_days: default_warn_days(),
            actor: default_actor(),
        }
    }
}
