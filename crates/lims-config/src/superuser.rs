//! Initial superuser configuration, used by `lims create-superuser` when
//! flags are omitted.

use serde::{Deserialize, Serialize};

fn default_username() -> String {
    "admin".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuperuserConfig {
    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

impl Default for SuperuserConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            email: String::new(),
            password: String::new(),
        }
    }
}

impl SuperuserConfig {
    /// A superuser can be created only with a password.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = SuperuserConfig::default();
        assert_eq!(config.username, "admin");
        assert!(!config.is_configured());
    }

    #[test]
    fn configured_with_password() {
        let config = SuperuserConfig {
            password: "s3cret".into(),
            ..Default::default()
        };
        assert!(config.is_configured());
    }
}
