//! The deadline job: reclassify project deadlines and alert lab contacts.
//!
//! Only changes are written. Running the job twice at the same instant
//! leaves the second pass with nothing to do.

use chrono::{DateTime, Utc};
use lims_config::NotificationsConfig;
use lims_core::audit_detail::StatusChangedDetail;
use lims_core::entities::Project;
use lims_core::enums::{AuditAction, DeadlineStatus, EntityType};
use lims_core::responses::DeadlineReport;

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, db_now, to_db_time, to_detail};
use crate::notify::{Notification, Notifier, send_best_effort};
use crate::repos::project::{PROJECT_COLS, row_to_project};
use crate::service::LimsService;

/// Name the job is registered under in the scheduler.
pub const DEADLINE_JOB: &str = "process_deadlines";

fn alert_notification(
    project: &Project,
    status: DeadlineStatus,
    recipient: String,
    config: &NotificationsConfig,
) -> Notification {
    let (headline, verb) = match status {
        DeadlineStatus::Overdue => ("Deadline passed", "passed its deadline"),
        _ => ("Deadline approaching", "is approaching its deadline"),
    };
    let due = project
        .deadline
        .map_or_else(|| "unknown".to_string(), |d| d.format("%Y-%m-%d %H:%M UTC").to_string());
    Notification {
        subject: config.subject(&format!("{headline}: {}", project.identifier)),
        body: format!(
            "Project {} ({}) {verb}.\nDeadline: {due}",
            project.identifier, project.name
        ),
        recipients: vec![recipient],
    }
}

impl LimsService {
    /// Classify every non-archived project at `now` and persist changes.
    ///
    /// A change into `warning` or `overdue` notifies the project's primary
    /// lab contact when that user has an email address. Delivery failures
    /// are logged and do not stop the pass.
    pub async fn process_deadlines<N: Notifier>(
        &self,
        now: DateTime<Utc>,
        notifier: &N,
        notifications: &NotificationsConfig,
    ) -> Result<DeadlineReport, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {PROJECT_COLS} FROM projects WHERE archived = 0 ORDER BY identifier"),
                (),
            )
            .await?;
        let projects = collect_rows(rows, row_to_project).await?;

        let mut report = DeadlineReport::default();
        for project in projects {
            report.checked += 1;
            let status = DeadlineStatus::evaluate(project.deadline, project.deadline_warn, now);
            if status == project.deadline_status {
                continue;
            }

            self.write_deadline_status(&project, status).await?;
            report.updated += 1;
            tracing::info!(
                project = %project.identifier,
                from = %project.deadline_status,
                to = %status,
                "deadline status changed"
            );

            if status.is_alert() && self.notify_contact(&project, status, notifier, notifications).await {
                report.notified += 1;
            }
        }

        tracing::info!(
            checked = report.checked,
            updated = report.updated,
            notified = report.notified,
            "deadline pass complete"
        );
        Ok(report)
    }

    async fn write_deadline_status(
        &self,
        project: &Project,
        status: DeadlineStatus,
    ) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE projects SET deadline_status = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![status.as_str(), to_db_time(db_now()), project.id.as_str()],
            )
            .await?;
        let detail = StatusChangedDetail {
            from: project.deadline_status.as_str().to_string(),
            to: status.as_str().to_string(),
            reason: Some("deadline check".to_string()),
        };
        self.record(EntityType::Project, &project.id, AuditAction::StatusChanged, to_detail(&detail)?)
            .await
    }

    /// Best effort: never fails, returns whether a notification went out.
    async fn notify_contact<N: Notifier>(
        &self,
        project: &Project,
        status: DeadlineStatus,
        notifier: &N,
        notifications: &NotificationsConfig,
    ) -> bool {
        let Some(ref contact_id) = project.primary_lab_contact else {
            tracing::debug!(project = %project.identifier, "no lab contact; not notified");
            return false;
        };
        let email = match self.get_user(contact_id).await {
            Ok(user) => user.email,
            Err(e) => {
                tracing::warn!(project = %project.identifier, error = %e, "lab contact lookup failed");
                return false;
            }
        };
        let Some(email) = email else {
            tracing::debug!(project = %project.identifier, "lab contact has no email; not notified");
            return false;
        };
        let notification = alert_notification(project, status, email, notifications);
        send_best_effort(notifier, &notification).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ConfiguredNotifier, RecordingNotifier};
    use crate::repos::account::NewUser;
    use crate::repos::project::NewProject;
    use crate::test_support::helpers::test_service;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn deadline() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 30, 12, 0, 0).unwrap()
    }

    async fn contact(svc: &LimsService, email: Option<&str>) -> String {
        svc.create_user(NewUser {
            username: "pi".into(),
            email: email.map(String::from),
            password: "pw".into(),
            ..NewUser::default()
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn classifies_and_is_idempotent() {
        let svc = test_service().await;
        let notifier = RecordingNotifier::default();
        let config = NotificationsConfig::default();
        let pi = contact(&svc, Some("pi@lab.example")).await;

        svc.create_project(
            NewProject::new("Due soon", "P-1")
                .deadline(deadline(), None, 7)
                .lab_contact(&pi),
        )
        .await
        .unwrap();
        svc.create_project(NewProject::new("Later", "P-2").deadline(deadline() + Duration::days(60), None, 7))
            .await
            .unwrap();
        svc.create_project(NewProject::new("Open ended", "P-3")).await.unwrap();

        let now = deadline() - Duration::days(2);
        let first = svc.process_deadlines(now, &notifier, &config).await.unwrap();
        assert_eq!(
            first,
            DeadlineReport {
                checked: 3,
                updated: 1,
                notified: 1
            }
        );
        let sent = notifier.sent();
        assert_eq!(sent[0].recipients, vec!["pi@lab.example".to_string()]);
        assert!(sent[0].subject.starts_with("[LIMS] Deadline approaching: P-1"));

        let second = svc.process_deadlines(now, &notifier, &config).await.unwrap();
        assert_eq!(second.updated, 0);
        assert_eq!(second.notified, 0);
        assert_eq!(notifier.sent().len(), 1);

        let p1 = svc.get_project_by_identifier("P-1").await.unwrap();
        assert_eq!(p1.deadline_status, DeadlineStatus::Warning);
        let p3 = svc.get_project_by_identifier("P-3").await.unwrap();
        assert_eq!(p3.deadline_status, DeadlineStatus::None);
    }

    #[tokio::test]
    async fn overdue_wins_and_notifies_again() {
        let svc = test_service().await;
        let notifier = RecordingNotifier::default();
        let config = NotificationsConfig::default();
        let pi = contact(&svc, Some("pi@lab.example")).await;
        svc.create_project(NewProject::new("Due", "P-1").deadline(deadline(), None, 7).lab_contact(&pi))
            .await
            .unwrap();

        svc.process_deadlines(deadline() - Duration::days(1), &notifier, &config)
            .await
            .unwrap();
        let report = svc.process_deadlines(deadline(), &notifier, &config).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(
            svc.get_project_by_identifier("P-1").await.unwrap().deadline_status,
            DeadlineStatus::Overdue
        );
        let subjects: Vec<String> = notifier.sent().into_iter().map(|n| n.subject).collect();
        assert_eq!(subjects.len(), 2);
        assert!(subjects[1].contains("Deadline passed"));
    }

    #[tokio::test]
    async fn archived_projects_are_ignored() {
        let svc = test_service().await;
        let project = svc
            .create_project(NewProject::new("Old", "P-1").deadline(deadline(), None, 7))
            .await
            .unwrap();
        svc.archive_project(&project.id).await.unwrap();

        let report = svc
            .process_deadlines(deadline(), &RecordingNotifier::default(), &NotificationsConfig::default())
            .await
            .unwrap();
        assert_eq!(report, DeadlineReport::default());
    }

    #[tokio::test]
    async fn failed_delivery_still_updates_status() {
        let svc = test_service().await;
        let pi = contact(&svc, Some("pi@lab.example")).await;
        svc.create_project(NewProject::new("Due", "P-1").deadline(deadline(), None, 7).lab_contact(&pi))
            .await
            .unwrap();

        let report = svc
            .process_deadlines(deadline(), &RecordingNotifier::failing(), &NotificationsConfig::default())
            .await
            .unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.notified, 0);
    }

    #[tokio::test]
    async fn disabled_notifications_are_not_counted() {
        let svc = test_service().await;
        let config = NotificationsConfig {
            enabled: false,
            ..NotificationsConfig::default()
        };
        let notifier = ConfiguredNotifier::from_config(&config);
        let pi = contact(&svc, Some("pi@lab.example")).await;
        svc.create_project(NewProject::new("Due", "P-1").deadline(deadline(), None, 7).lab_contact(&pi))
            .await
            .unwrap();

        let report = svc.process_deadlines(deadline(), &notifier, &config).await.unwrap();
        assert_eq!((report.updated, report.notified), (1, 0));
        assert_eq!(
            svc.get_project_by_identifier("P-1").await.unwrap().deadline_status,
            DeadlineStatus::Overdue
        );
    }

    #[tokio::test]
    async fn contact_without_email_is_not_notified() {
        let svc = test_service().await;
        let notifier = RecordingNotifier::default();
        let pi = contact(&svc, None).await;
        svc.create_project(NewProject::new("Due", "P-1").deadline(deadline(), None, 7).lab_contact(&pi))
            .await
            .unwrap();

        let report = svc
            .process_deadlines(deadline(), &notifier, &NotificationsConfig::default())
            .await
            .unwrap();
        assert_eq!((report.updated, report.notified), (1, 0));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn job_actor_is_recorded() {
        let svc = test_service().await.with_actor("deadline-job");
        svc.create_project(NewProject::new("Due", "P-1").deadline(deadline(), None, 7))
            .await
            .unwrap();
        svc.process_deadlines(deadline(), &RecordingNotifier::default(), &NotificationsConfig::default())
            .await
            .unwrap();

        let entries = svc
            .query_audit(&crate::repos::audit::AuditFilter {
                action: Some(AuditAction::StatusChanged),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor.as_deref(), Some("deadline-job"));
    }
}
