use std::path::PathBuf;

use anyhow::Context;
use lims_config::LimsConfig;
use lims_db::service::LimsService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: LimsService,
    pub config: LimsConfig,
    pub project_root: PathBuf,
}

impl AppContext {
    /// Open the project's database, applying pending migrations.
    ///
    /// `actor` overrides `general.default_actor` for the audit trail.
    pub async fn init(
        project_root: PathBuf,
        config: LimsConfig,
        actor: Option<&str>,
    ) -> anyhow::Result<Self> {
        let db_path = config.database.resolve(&project_root);
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let actor = actor.unwrap_or(&config.general.default_actor).to_string();

        tracing::debug!(path = %db_path.display(), %actor, "opening database");
        let service = LimsService::new_local(&db_path.to_string_lossy(), actor)
            .await
            .with_context(|| format!("failed to open database at {}", db_path.display()))?;

        Ok(Self {
            service,
            config,
            project_root,
        })
    }
}
