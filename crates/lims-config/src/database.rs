//! Local libSQL database configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// In-memory database marker understood by libSQL.
pub const MEMORY_PATH: &str = ":memory:";

fn default_path() -> String {
    "lims.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database file. Relative paths resolve against the project's `.lims/` directory.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_PATH
    }

    /// Resolve the database location for a project rooted at `project_root`.
    #[must_use]
    pub fn resolve(&self, project_root: &Path) -> PathBuf {
        let path = Path::new(&self.path);
        if self.is_memory() || path.is_absolute() {
            path.to_path_buf()
        } else {
            project_root.join(".lims").join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_resolves_under_dot_lims() {
        let config = DatabaseConfig::default();
        assert_eq!(
            config.resolve(Path::new("/srv/lab")),
            PathBuf::from("/srv/lab/.lims/lims.db")
        );
    }

    #[test]
    fn memory_and_absolute_paths_are_kept() {
        let memory = DatabaseConfig {
            path: MEMORY_PATH.into(),
        };
        assert!(memory.is_memory());
        assert_eq!(memory.resolve(Path::new("/srv/lab")), PathBuf::from(":memory:"));

        let absolute = DatabaseConfig {
            path: "/var/lib/lims/main.db".into(),
        };
        assert_eq!(
            absolute.resolve(Path::new("/srv/lab")),
            PathBuf::from("/var/lib/lims/main.db")
        );
    }
}
