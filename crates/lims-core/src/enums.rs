//! Status enums, entity types, roles, and audit actions for the LIMS.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Status enums with state machines provide `allowed_next_states()` to enforce
//! valid transitions at the application layer.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// DataEntryState
// ---------------------------------------------------------------------------

/// Result state of one data entry recorded for a task step within a run.
///
/// ```text
/// active → succeeded
///        → failed
///        → repeat_succeeded
///        → repeat_failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataEntryState {
    Active,
    Succeeded,
    Failed,
    RepeatSucceeded,
    RepeatFailed,
}

impl DataEntryState {
    pub const ALL: [Self; 5] = [
        Self::Active,
        Self::Succeeded,
        Self::Failed,
        Self::RepeatSucceeded,
        Self::RepeatFailed,
    ];

    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Active => &[
                Self::Succeeded,
                Self::Failed,
                Self::RepeatSucceeded,
                Self::RepeatFailed,
            ],
            Self::Succeeded | Self::Failed | Self::RepeatSucceeded | Self::RepeatFailed => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Terminal state for a finished task step.
    #[must_use]
    pub const fn outcome(succeeded: bool, repeat: bool) -> Self {
        match (succeeded, repeat) {
            (true, false) => Self::Succeeded,
            (false, false) => Self::Failed,
            (true, true) => Self::RepeatSucceeded,
            (false, true) => Self::RepeatFailed,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::RepeatSucceeded => "repeat_succeeded",
            Self::RepeatFailed => "repeat_failed",
        }
    }
}

impl fmt::Display for DataEntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RunPhase
// ---------------------------------------------------------------------------

/// Phase of a run, derived from its `has_started`/`task_in_progress`/`is_active` flags.
///
/// ```text
/// pending → idle → in_progress → idle (next task, or repeat)
///                              → finished (last task done)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Pending,
    Idle,
    InProgress,
    Finished,
}

impl RunPhase {
    #[must_use]
    pub const fn from_flags(has_started: bool, task_in_progress: bool, is_active: bool) -> Self {
        match (has_started, task_in_progress, is_active) {
            (false, _, _) => Self::Pending,
            (true, true, _) => Self::InProgress,
            (true, false, true) => Self::Idle,
            (true, false, false) => Self::Finished,
        }
    }

    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Idle],
            Self::Idle => &[Self::InProgress],
            Self::InProgress => &[Self::Idle, Self::Finished],
            Self::Finished => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Idle => "idle",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DeadlineStatus
// ---------------------------------------------------------------------------

/// Deadline standing of a project, recomputed by the scheduled deadline job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    None,
    OnSchedule,
    Warning,
    Overdue,
}

impl DeadlineStatus {
    /// Classify a deadline at `now`.
    ///
    /// Overdue wins over warning; a missing deadline is always `None`.
    #[must_use]
    pub fn evaluate(
        deadline: Option<DateTime<Utc>>,
        deadline_warn: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let Some(deadline) = deadline else {
            return Self::None;
        };
        if now >= deadline {
            return Self::Overdue;
        }
        match deadline_warn {
            Some(warn) if now >= warn => Self::Warning,
            _ => Self::OnSchedule,
        }
    }

    /// Whether moving into this status should notify the lab contact.
    #[must_use]
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::Warning | Self::Overdue)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OnSchedule => "on_schedule",
            Self::Warning => "warning",
            Self::Overdue => "overdue",
        }
    }
}

impl fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EquipmentStatus
// ---------------------------------------------------------------------------

/// Operational status of a piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Idle,
    Active,
    Error,
    Retired,
}

impl EquipmentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Error => "error",
            Self::Retired => "retired",
        }
    }
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PriceType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    Internal,
    External,
}

impl PriceType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The three fixed account roles. Each maps to a group of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Staff,
    User,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Admin, Self::Staff, Self::User];

    /// Roles granted to every newly created superuser.
    pub const SUPERUSER_GROUPS: [Self; 2] = [Self::Staff, Self::Admin];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    StatusChanged,
    Linked,
    Unlinked,
    Taken,
    Completed,
    Reversed,
    Started,
    Finished,
    Stopped,
    Synced,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::StatusChanged => "status_changed",
            Self::Linked => "linked",
            Self::Unlinked => "unlinked",
            Self::Taken => "taken",
            Self::Completed => "completed",
            Self::Reversed => "reversed",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Stopped => "stopped",
            Self::Synced => "synced",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Every auditable entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    ItemType,
    Location,
    InventorySet,
    Item,
    ItemTransfer,
    TaskTemplate,
    Workflow,
    Run,
    DataEntry,
    Project,
    Product,
    ProjectLink,
    ProductAttachment,
    CrmAccount,
    CrmProject,
    CrmQuote,
    Equipment,
    Reservation,
    DataFile,
    Price,
    User,
    Group,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ItemType => "item_type",
            Self::Location => "location",
            Self::InventorySet => "inventory_set",
            Self::Item => "item",
            Self::ItemTransfer => "item_transfer",
            Self::TaskTemplate => "task_template",
            Self::Workflow => "workflow",
            Self::Run => "run",
            Self::DataEntry => "data_entry",
            Self::Project => "project",
            Self::Product => "product",
            Self::ProjectLink => "project_link",
            Self::ProductAttachment => "product_attachment",
            Self::CrmAccount => "crm_account",
            Self::CrmProject => "crm_project",
            Self::CrmQuote => "crm_quote",
            Self::Equipment => "equipment",
            Self::Reservation => "reservation",
            Self::DataFile => "data_file",
            Self::Price => "price",
            Self::User => "user",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    #[rstest]
    #[case(DataEntryState::Succeeded)]
    #[case(DataEntryState::Failed)]
    #[case(DataEntryState::RepeatSucceeded)]
    #[case(DataEntryState::RepeatFailed)]
    fn active_reaches_every_terminal_state(#[case] next: DataEntryState) {
        assert!(DataEntryState::Active.can_transition_to(next));
        assert!(next.is_terminal());
        assert!(next.allowed_next_states().is_empty());
    }

    #[test]
    fn terminal_states_never_transition() {
        for from in DataEntryState::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in DataEntryState::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn active_cannot_transition_to_itself() {
        assert!(!DataEntryState::Active.can_transition_to(DataEntryState::Active));
    }

    #[rstest]
    #[case(true, false, DataEntryState::Succeeded)]
    #[case(false, false, DataEntryState::Failed)]
    #[case(true, true, DataEntryState::RepeatSucceeded)]
    #[case(false, true, DataEntryState::RepeatFailed)]
    fn outcome_maps_flags(#[case] ok: bool, #[case] repeat: bool, #[case] want: DataEntryState) {
        assert_eq!(DataEntryState::outcome(ok, repeat), want);
    }

    #[test]
    fn data_entry_state_serializes_snake_case() {
        let json = serde_json::to_string(&DataEntryState::RepeatSucceeded).unwrap();
        assert_eq!(json, "\"repeat_succeeded\"");
        for state in DataEntryState::ALL {
            let json = serde_json::to_value(state).unwrap();
            assert_eq!(json.as_str(), Some(state.as_str()));
        }
    }

    #[rstest]
    #[case(false, false, false, RunPhase::Pending)]
    #[case(true, false, true, RunPhase::Idle)]
    #[case(true, true, true, RunPhase::InProgress)]
    #[case(true, false, false, RunPhase::Finished)]
    fn run_phase_from_flags(
        #[case] started: bool,
        #[case] in_progress: bool,
        #[case] active: bool,
        #[case] want: RunPhase,
    ) {
        assert_eq!(RunPhase::from_flags(started, in_progress, active), want);
    }

    #[test]
    fn run_phase_finished_is_terminal() {
        assert!(RunPhase::Finished.allowed_next_states().is_empty());
        assert!(RunPhase::InProgress.can_transition_to(RunPhase::Finished));
        assert!(!RunPhase::Pending.can_transition_to(RunPhase::InProgress));
    }

    #[test]
    fn deadline_evaluation() {
        let deadline = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let warn = deadline - Duration::days(2);

        assert_eq!(
            DeadlineStatus::evaluate(None, Some(warn), deadline),
            DeadlineStatus::None
        );
        assert_eq!(
            DeadlineStatus::evaluate(Some(deadline), Some(warn), warn - Duration::hours(1)),
            DeadlineStatus::OnSchedule
        );
        assert_eq!(
            DeadlineStatus::evaluate(Some(deadline), Some(warn), warn),
            DeadlineStatus::Warning
        );
        assert_eq!(
            DeadlineStatus::evaluate(Some(deadline), Some(warn), deadline),
            DeadlineStatus::Overdue
        );
        assert_eq!(
            DeadlineStatus::evaluate(Some(deadline), None, deadline - Duration::minutes(1)),
            DeadlineStatus::OnSchedule
        );
    }

    #[test]
    fn alert_statuses() {
        assert!(DeadlineStatus::Warning.is_alert());
        assert!(DeadlineStatus::Overdue.is_alert());
        assert!(!DeadlineStatus::OnSchedule.is_alert());
        assert!(!DeadlineStatus::None.is_alert());
    }

    #[test]
    fn superuser_groups_are_staff_and_admin() {
        assert_eq!(Role::SUPERUSER_GROUPS, [Role::Staff, Role::Admin]);
        assert_eq!(Role::ALL.len(), 3);
    }
}
