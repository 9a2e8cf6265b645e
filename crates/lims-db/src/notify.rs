//! Notification seam.
//!
//! The deadline job reports status changes through a [`Notifier`]. Delivery
//! is best effort: a failed send is logged and never fails the caller.
//! No mail transport ships with the crate; [`LogNotifier`] writes to the
//! tracing log and [`DisabledNotifier`] refuses everything.

use std::future::Future;
use std::sync::Mutex;

use lims_config::NotificationsConfig;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification has no recipients")]
    NoRecipients,

    #[error("Notifications are disabled")]
    Disabled,

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Delivers notifications to their recipients.
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    fn send(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Send and swallow failures. Returns whether delivery succeeded.
pub async fn send_best_effort<N: Notifier>(notifier: &N, notification: &Notification) -> bool {
    if notification.recipients.is_empty() {
        tracing::warn!(subject = %notification.subject, "notification skipped: no recipients");
        return false;
    }
    match notifier.send(notification).await {
        Ok(()) => true,
        Err(NotifyError::Disabled) => {
            tracing::debug!(subject = %notification.subject, "notifications disabled; not sent");
            false
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                subject = %notification.subject,
                "notification delivery failed"
            );
            false
        }
    }
}

/// Writes notifications to the tracing log at `info`.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    sender: String,
}

impl LogNotifier {
    #[must_use]
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        tracing::info!(
            from = %self.sender,
            to = %notification.recipients.join(", "),
            subject = %notification.subject,
            "{}",
            notification.body
        );
        Ok(())
    }
}

/// Refuses every notification with [`NotifyError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Disabled)
    }
}

/// The notifier selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredNotifier {
    Log(LogNotifier),
    Disabled(DisabledNotifier),
}

impl ConfiguredNotifier {
    #[must_use]
    pub fn from_config(config: &NotificationsConfig) -> Self {
        if config.enabled {
            Self::Log(LogNotifier::new(config.sender.clone()))
        } else {
            Self::Disabled(DisabledNotifier)
        }
    }
}

impl Notifier for ConfiguredNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        match self {
            Self::Log(inner) => inner.send(notification).await,
            Self::Disabled(inner) => inner.send(notification).await,
        }
    }
}

/// Records every notification in memory. Useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    /// A notifier whose every delivery fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Notifications accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Delivery("recording notifier set to fail".into()));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|e| NotifyError::Delivery(format!("poisoned: {e}")))?;
        sent.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(recipients: &[&str]) -> Notification {
        Notification {
            subject: "[LIMS] Deadline warning: P-1".into(),
            body: "Project P-1 is due soon.".into(),
            recipients: recipients.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn best_effort_reports_success() {
        let notifier = RecordingNotifier::default();
        assert!(send_best_effort(&notifier, &notification(&["a@lab.example"])).await);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn best_effort_swallows_failure() {
        let notifier = RecordingNotifier::failing();
        assert!(!send_best_effort(&notifier, &notification(&["a@lab.example"])).await);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn best_effort_skips_empty_recipients() {
        let notifier = RecordingNotifier::default();
        assert!(!send_best_effort(&notifier, &notification(&[])).await);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn configured_notifier_follows_enabled_flag() {
        let disabled = ConfiguredNotifier::from_config(&NotificationsConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(matches!(disabled, ConfiguredNotifier::Disabled(_)));
        assert!(matches!(
            disabled.send(&notification(&["a@lab.example"])).await,
            Err(NotifyError::Disabled)
        ));
        assert!(!send_best_effort(&disabled, &notification(&["a@lab.example"])).await);

        let enabled = ConfiguredNotifier::from_config(&NotificationsConfig::default());
        assert!(matches!(enabled, ConfiguredNotifier::Log(_)));
        assert!(matches!(
            enabled.send(&notification(&[])).await,
            Err(NotifyError::NoRecipients)
        ));
    }
}
