//! Cron-driven background jobs.
//!
//! One job today: `process_deadlines`. The loop wakes every
//! `scheduler.poll_interval_secs`, runs whatever came due since the last
//! wake-up, and logs failures without stopping.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use lims_config::LimsConfig;
use lims_core::responses::DeadlineReport;
use lims_db::notify::ConfiguredNotifier;
use lims_db::repos::deadlines::DEADLINE_JOB;
use lims_db::service::LimsService;
use serde::Serialize;

/// Parse a cron expression. Five-field (minute-first) expressions get a
/// leading `0` seconds field.
pub fn parse_cron(expr: &str) -> anyhow::Result<Schedule> {
    let expr = expr.trim();
    let full = if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    };
    full.parse::<Schedule>()
        .map_err(|e| anyhow::anyhow!("invalid cron expression '{expr}': {e}"))
}

/// A named job and when it next fires.
#[derive(Debug)]
pub struct Job {
    pub name: &'static str,
    schedule: Schedule,
    next: Option<DateTime<Utc>>,
}

impl Job {
    fn new(name: &'static str, schedule: Schedule, now: DateTime<Utc>) -> Self {
        let next = schedule.after(&now).next();
        Self {
            name,
            schedule,
            next,
        }
    }

    /// The next `count` fire times after `now`.
    #[must_use]
    pub fn upcoming(&self, now: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        self.schedule.after(&now).take(count).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct JobPreview {
    pub job: &'static str,
    pub next: Vec<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct Scheduler {
    jobs: Vec<Job>,
}

impl Scheduler {
    /// Register every job from configuration, anchored at `now`.
    pub fn from_config(config: &LimsConfig, now: DateTime<Utc>) -> anyhow::Result<Self> {
        let deadlines = parse_cron(&config.scheduler.deadline_cron)?;
        Ok(Self {
            jobs: vec![Job::new(DEADLINE_JOB, deadlines, now)],
        })
    }

    #[must_use]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Jobs whose fire time has passed. Each is rescheduled after `now`, so
    /// several missed fire times collapse into one run.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<&'static str> {
        let mut due = Vec::new();
        for job in &mut self.jobs {
            if job.next.is_some_and(|next| next <= now) {
                due.push(job.name);
                job.next = job.schedule.after(&now).next();
            }
        }
        due
    }

    #[must_use]
    pub fn preview(&self, now: DateTime<Utc>, count: usize) -> Vec<JobPreview> {
        self.jobs
            .iter()
            .map(|job| JobPreview {
                job: job.name,
                next: job.upcoming(now, count),
            })
            .collect()
    }
}

/// Run the deadline job once at `now`.
pub async fn run_deadline_job(
    service: &LimsService,
    config: &LimsConfig,
    now: DateTime<Utc>,
) -> anyhow::Result<DeadlineReport> {
    let notifier = ConfiguredNotifier::from_config(&config.notifications);
    Ok(service
        .process_deadlines(now, &notifier, &config.notifications)
        .await?)
}

async fn run_job(name: &str, service: &LimsService, config: &LimsConfig) -> anyhow::Result<()> {
    match name {
        DEADLINE_JOB => {
            run_deadline_job(service, config, Utc::now()).await?;
            Ok(())
        }
        other => anyhow::bail!("unknown job '{other}'"),
    }
}

/// Poll for due jobs until Ctrl-C.
pub async fn run_loop(service: &LimsService, config: &LimsConfig) -> anyhow::Result<()> {
    if !config.scheduler.enabled {
        tracing::warn!("scheduler.enabled is false; nothing to run");
        return Ok(());
    }
    let mut scheduler = Scheduler::from_config(config, Utc::now())?;
    for job in scheduler.jobs() {
        tracing::info!(job = job.name, next = ?job.next, "job scheduled");
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(config.scheduler.poll_interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("scheduler stopping");
                return Ok(());
            }
        }

        for name in scheduler.take_due(Utc::now()) {
            tracing::info!(job = name, "running job");
            if let Err(error) = run_job(name, service, config).await {
                tracing::error!(job = name, error = %error, "job failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, hour, minute, 0).unwrap()
    }

    #[test]
    fn five_field_expressions_gain_seconds() {
        assert!(parse_cron("0 */3 * * *").is_ok());
        assert!(parse_cron("0 0 */3 * * *").is_ok());
        assert!(parse_cron("every three hours").is_err());
    }

    #[test]
    fn deadline_job_fires_every_third_hour_on_the_hour() {
        let config = LimsConfig::default();
        let scheduler = Scheduler::from_config(&config, at(0, 0)).unwrap();
        let previews = scheduler.preview(Utc.with_ymd_and_hms(2026, 3, 13, 23, 59, 0).unwrap(), 8);
        assert_eq!(previews[0].job, DEADLINE_JOB);

        let hours: Vec<u32> = previews[0].next.iter().map(Timelike::hour).collect();
        assert_eq!(hours, vec![0, 3, 6, 9, 12, 15, 18, 21]);
        assert!(previews[0].next.iter().all(|t| t.minute() == 0 && t.second() == 0));
    }

    #[test]
    fn missed_fire_times_collapse_into_one_run() {
        let mut scheduler = Scheduler::from_config(&LimsConfig::default(), at(1, 0)).unwrap();
        assert!(scheduler.take_due(at(2, 59)).is_empty());
        assert_eq!(scheduler.take_due(at(3, 0)), vec![DEADLINE_JOB]);
        assert!(scheduler.take_due(at(3, 1)).is_empty());

        // Asleep from 03:01 until 10:30: one run, next at 12:00.
        assert_eq!(scheduler.take_due(at(10, 30)), vec![DEADLINE_JOB]);
        assert_eq!(scheduler.jobs()[0].next, Some(at(12, 0)));
    }

    #[tokio::test]
    async fn deadline_job_runs_against_a_service() {
        let service = LimsService::new_local(":memory:", "deadline-job").await.unwrap();
        let report = run_deadline_job(&service, &LimsConfig::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(report, DeadlineReport::default());
    }
}
