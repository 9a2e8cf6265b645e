use std::path::{Path, PathBuf};

/// Name of the per-project directory holding the database and config.
pub const PROJECT_DIR: &str = ".lims";

/// Walk upwards from `start` until a `.lims` directory is found.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(PROJECT_DIR).is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{PROJECT_DIR, find_project_root};

    #[test]
    fn finds_project_root_in_current_directory() {
        let temp = TempDir::new().expect("tempdir should create");
        std::fs::create_dir(temp.path().join(PROJECT_DIR)).expect(".lims should create");

        let found = find_project_root(temp.path());
        assert_eq!(found.as_deref(), Some(temp.path()));
    }

    #[test]
    fn finds_project_root_in_parent_directory() {
        let temp = TempDir::new().expect("tempdir should create");
        std::fs::create_dir(temp.path().join(PROJECT_DIR)).expect(".lims should create");
        std::fs::create_dir_all(temp.path().join("runs/2026/batch-7")).expect("nested dirs should create");

        let found = find_project_root(&temp.path().join("runs/2026/batch-7"));
        assert_eq!(found.as_deref(), Some(temp.path()));
    }

    #[test]
    fn returns_none_when_not_found() {
        let temp = TempDir::new().expect("tempdir should create");
        std::fs::create_dir_all(temp.path().join("a/b")).expect("nested dirs should create");

        assert!(find_project_root(&temp.path().join("a/b")).is_none());
    }
}
