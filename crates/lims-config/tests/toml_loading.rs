//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed file and env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use lims_config::LimsConfig;
use lims_core::enums::Role;
use pretty_assertions::assert_eq;

#[test]
fn loads_scheduler_and_deadlines_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[scheduler]
deadline_cron = "30 */6 * * *"
poll_interval_secs = 15

[deadlines]
default_warn_days = 3
actor = "nightly"
"#,
        )?;

        let config: LimsConfig = Figment::from(Serialized::defaults(LimsConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.scheduler.deadline_cron, "30 */6 * * *");
        assert_eq!(config.scheduler.poll_interval_secs, 15);
        assert!(config.scheduler.enabled);
        assert_eq!(config.deadlines.default_warn_days, 3);
        assert_eq!(config.deadlines.actor, "nightly");
        Ok(())
    });
}

#[test]
fn role_permissions_replace_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[roles]
user = ["inventory.view_item"]
"#,
        )?;

        let config: LimsConfig = Figment::from(Serialized::defaults(LimsConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(
            config.roles.permissions_for(Role::User),
            &["inventory.view_item".to_string()]
        );
        assert_eq!(
            config.roles.permissions_for(Role::Admin),
            LimsConfig::default().roles.permissions_for(Role::Admin)
        );
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up_by_load_from() {
    Jail::expect_with(|jail| {
        jail.create_dir(".lims")?;
        jail.create_file(
            ".lims/config.toml",
            r#"
[database]
path = "lab.db"

[notifications]
enabled = false
"#,
        )?;

        let config = LimsConfig::load_from(jail.directory()).expect("config loads");
        assert_eq!(config.database.path, "lab.db");
        assert!(!config.notifications.enabled);
        Ok(())
    });
}

#[test]
fn malformed_permission_fails_validation() {
    Jail::expect_with(|jail| {
        jail.create_dir(".lims")?;
        jail.create_file(
            ".lims/config.toml",
            r#"
[roles]
staff = ["add item"]
"#,
        )?;

        let err = LimsConfig::load_from(jail.directory()).unwrap_err();
        assert!(err.to_string().contains("roles"));
        Ok(())
    });
}
