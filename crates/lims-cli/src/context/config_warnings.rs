use lims_config::LimsConfig;

const SECTIONS: [&str; 7] = [
    "DATABASE",
    "SCHEDULER",
    "DEADLINES",
    "NOTIFICATIONS",
    "ROLES",
    "SUPERUSER",
    "GENERAL",
];

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &LimsConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &LimsConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();
    let mut warnings = Vec::new();

    for key in &env_keys {
        for section in SECTIONS {
            let single = format!("LIMS_{section}_");
            let double = format!("LIMS_{section}__");
            if key.starts_with(&single) && !key.starts_with(&double) {
                warnings.push(format!(
                    "{key} is ignored. Use double underscores between section and field (example: {}).",
                    key.replacen(&single, &double, 1)
                ));
            }
        }
    }

    if !config.superuser.is_configured()
        && env_keys.iter().any(|key| key.starts_with("LIMS_SUPERUSER__"))
    {
        warnings.push(
            "Superuser config has no password while LIMS_SUPERUSER__* env vars exist. Set LIMS_SUPERUSER__PASSWORD."
                .to_string(),
        );
    }

    warnings
}
