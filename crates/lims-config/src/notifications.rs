//! Notification configuration. Only the delivery seam is configured here;
//! transports plug in behind `lims_db::notify::Notifier`.

use serde::{Deserialize, Serialize};

const fn default_enabled() -> bool {
    true
}

fn default_sender() -> String {
    "lims@localhost".to_string()
}

fn default_subject_prefix() -> String {
    "[LIMS]".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_sender")]
    pub sender: String,

    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sender: default_sender(),
            subject_prefix: default_subject_prefix(),
        }
    }
}

impl NotificationsConfig {
    #[must_use]
    pub fn subject(&self, text: &str) -> String {
        if self.subject_prefix.is_empty() {
            text.to_string()
        } else {
            format!("{} {text}", self.subject_prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_is_prefixed() {
        let config = NotificationsConfig::default();
        assert_eq!(config.subject("Deadline warning"), "[LIMS] Deadline warning");

        let bare = NotificationsConfig {
            subject_prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(bare.subject("Overdue"), "Overdue");
    }
}
