//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default result limit.
const fn default_limit() -> u32 {
    20
}

fn default_actor() -> String {
    "lims".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default result limit for list commands.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Actor recorded in the audit trail when none is given on the command line.
    #[serde(default = "default_actor")]
    pub default_actor: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_actor: default_actor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.default_actor, "lims");
    }
}
