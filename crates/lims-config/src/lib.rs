//! # lims-config
//!
//! Layered configuration loading for the LIMS using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`LIMS_*` prefix, `__` as separator)
//! 2. Project-level `.lims/config.toml`
//! 3. User-level `~/.config/lims/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `LIMS_SCHEDULER__DEADLINE_CRON` -> `scheduler.deadline_cron`,
//! `LIMS_DATABASE__PATH` -> `database.path`, etc. The `__` (double underscore)
//! separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use lims_config::LimsConfig;
//!
//! let config = LimsConfig::load_with_dotenv().expect("config");
//! println!("deadline job: {}", config.scheduler.deadline_cron);
//! ```

mod database;
mod deadlines;
mod error;
mod general;
mod notifications;
mod roles;
mod scheduler;
mod superuser;

pub use database::{DatabaseConfig, MEMORY_PATH};
pub use deadlines::DeadlinesConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use notifications::NotificationsConfig;
pub use roles::RolesConfig;
pub use scheduler::{DEFAULT_DEADLINE_CRON, SchedulerConfig};
pub use superuser::SuperuserConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LimsConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub deadlines: DeadlinesConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub roles: RolesConfig,
    #[serde(default)]
    pub superuser: SuperuserConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl LimsConfig {
    /// Load configuration from all sources (TOML files + environment variables),
    /// looking for the project file in the current directory.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source fails to parse or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration with the project file taken from `project_root/.lims/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source fails to parse or a value is invalid.
    pub fn load_from(project_root: &Path) -> Result<Self, ConfigError> {
        let config: Self = Self::figment_for(project_root).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source fails to parse or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain rooted at the current directory.
    #[must_use]
    pub fn figment() -> Figment {
        Self::figment_for(Path::new("."))
    }

    /// Build the figment provider chain for a project root.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    #[must_use]
    pub fn figment_for(project_root: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = Self::project_config_path(project_root);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("LIMS_").split("__"))
    }

    /// Path of the project-local config file.
    #[must_use]
    pub fn project_config_path(project_root: &Path) -> PathBuf {
        project_root.join(".lims").join("config.toml")
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lims").join("config.toml"))
    }

    /// Check values figment cannot check by type alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.deadline_cron.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.deadline_cron".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.scheduler.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.poll_interval_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        if let Some(codename) = self.roles.first_malformed() {
            return Err(ConfigError::InvalidValue {
                field: "roles".into(),
                reason: format!("'{codename}' is not of the form area.action_model"),
            });
        }
        Ok(())
    }

    /// Superuser settings, only when a password has been provided.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` when no password is set.
    pub fn require_superuser(&self) -> Result<&SuperuserConfig, ConfigError> {
        if self.superuser.is_configured() {
            Ok(&self.superuser)
        } else {
            Err(ConfigError::NotConfigured {
                section: "superuser".into(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LimsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.deadline_cron, DEFAULT_DEADLINE_CRON);
        assert!(config.notifications.enabled);
        assert!(config.require_superuser().is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut config = LimsConfig::default();
        config.scheduler.poll_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scheduler.poll_interval_secs"));
    }

    #[test]
    fn project_config_path_is_under_dot_lims() {
        assert_eq!(
            LimsConfig::project_config_path(Path::new("/srv/lab")),
            PathBuf::from("/srv/lab/.lims/config.toml")
        );
    }
}
