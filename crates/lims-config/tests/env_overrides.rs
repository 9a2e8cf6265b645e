use figment::Jail;
use lims_config::LimsConfig;

#[test]
fn env_overrides_nested_values() {
    Jail::expect_with(|jail| {
        jail.set_env("LIMS_SCHEDULER__DEADLINE_CRON", "0 0 * * *");
        jail.set_env("LIMS_SUPERUSER__PASSWORD", "from-env");
        jail.set_env("LIMS_GENERAL__DEFAULT_LIMIT", "50");

        let config = LimsConfig::load_from(jail.directory()).expect("config loads");
        assert_eq!(config.scheduler.deadline_cron, "0 0 * * *");
        assert_eq!(config.general.default_limit, 50);
        assert_eq!(config.require_superuser().expect("configured").password, "from-env");
        Ok(())
    });
}

#[test]
fn env_beats_project_file() {
    Jail::expect_with(|jail| {
        jail.create_dir(".lims")?;
        jail.create_file(
            ".lims/config.toml",
            r#"
[database]
path = "from-file.db"
"#,
        )?;
        jail.set_env("LIMS_DATABASE__PATH", "from-env.db");

        let config = LimsConfig::load_from(jail.directory()).expect("config loads");
        assert_eq!(config.database.path, "from-env.db");
        Ok(())
    });
}

#[test]
fn zero_poll_interval_from_env_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("LIMS_SCHEDULER__POLL_INTERVAL_SECS", "0");
        assert!(LimsConfig::load_from(jail.directory()).is_err());
        Ok(())
    });
}
