//! Follow-up task lifecycle.
//!
//! A new indicator supersedes whatever the patient still had open: every
//! pending follow-up is closed, then exactly one new task is opened with
//! a due date sized by the assessed risk.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, repository};
use crate::error::ServiceError;
use crate::models::{FollowUp, FollowUpFilter, FollowUpStatus, FollowUpUpdate, RiskLevel};

/// Due-date offset and task text for one risk tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpPlan {
    pub due_in_days: i64,
    pub description: String,
}

impl FollowUpPlan {
    fn new(due_in_days: i64, description: &str) -> Self {
        Self {
            due_in_days,
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpPolicy {
    pub high: FollowUpPlan,
    pub med: FollowUpPlan,
    pub low: FollowUpPlan,
}

impl Default for FollowUpPolicy {
    fn default() -> Self {
        Self {
            high: FollowUpPlan::new(3, "Urgent follow-up required due to high risk indicators."),
            med: FollowUpPlan::new(7, "Routine follow-up for medium risk monitoring."),
            low: FollowUpPlan::new(30, "Standard monthly health check."),
        }
    }
}

impl FollowUpPolicy {
    pub fn plan_for(&self, level: RiskLevel) -> &FollowUpPlan {
        match level {
            RiskLevel::High => &self.high,
            RiskLevel::Med => &self.med,
            RiskLevel::Low => &self.low,
        }
    }

    /// Build the pending task for `level` without persisting it.
    pub fn new_follow_up(
        &self,
        patient_id: Uuid,
        level: RiskLevel,
        now: NaiveDateTime,
    ) -> FollowUp {
        let plan = self.plan_for(level);
        FollowUp {
            id: Uuid::new_v4(),
            patient_id,
            task_description: plan.description.clone(),
            status: FollowUpStatus::Pending,
            due_date: now + Duration::days(plan.due_in_days),
            completed_at: None,
            created_at: now,
        }
    }
}

/// Outcome of processing one indicator.
#[derive(Debug, Clone, Serialize)]
pub struct FollowUpTransition {
    /// Pending tasks that were auto-completed.
    pub closed: usize,
    pub follow_up: FollowUp,
}

/// Close every pending follow-up of the patient and open one new task.
///
/// Runs on whatever connection it is given; callers wanting atomicity
/// with the indicator write pass a `Transaction`.
pub fn on_new_indicator(
    conn: &Connection,
    patient_id: &Uuid,
    level: RiskLevel,
    policy: &FollowUpPolicy,
    now: NaiveDateTime,
) -> Result<FollowUpTransition, ServiceError> {
    let closed = repository::complete_pending_follow_ups(conn, patient_id, &now)?;
    let follow_up = policy.new_follow_up(*patient_id, level, now);
    repository::insert_follow_up(conn, &follow_up)?;

    if closed > 0 {
        tracing::debug!(%patient_id, closed, "Superseded pending follow-ups");
    }

    Ok(FollowUpTransition { closed, follow_up })
}

/// Manual edit of a follow-up.
///
/// Completing sets `completed_at` once; completing an already completed
/// task keeps the original timestamp. Reopening is rejected.
pub fn update_follow_up(
    conn: &Connection,
    id: &Uuid,
    update: FollowUpUpdate,
    now: NaiveDateTime,
) -> Result<FollowUp, ServiceError> {
    let mut follow_up = repository::get_follow_up(conn, id)?
        .ok_or_else(|| ServiceError::not_found("follow_up", id))?;

    if let Some(description) = update.task_description {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::validation("Task description cannot be empty"));
        }
        follow_up.task_description = trimmed.to_string();
    }

    if let Some(due) = update.due_date {
        follow_up.due_date = db::storage_precision(due);
    }

    match (follow_up.status, update.status) {
        (FollowUpStatus::Pending, Some(FollowUpStatus::Completed)) => {
            follow_up.status = FollowUpStatus::Completed;
            follow_up.completed_at = Some(now);
        }
        (FollowUpStatus::Completed, Some(FollowUpStatus::Pending)) => {
            return Err(ServiceError::validation(
                "A completed follow-up cannot be reopened",
            ));
        }
        _ => {}
    }

    repository::update_follow_up(conn, &follow_up)?;
    Ok(follow_up)
}

pub fn list_follow_ups(
    conn: &Connection,
    filter: &FollowUpFilter,
) -> Result<Vec<FollowUp>, ServiceError> {
    Ok(repository::list_follow_ups(conn, filter)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{at, seed_patient, test_db};

    #[test]
    fn policy_due_dates_per_level() {
        let policy = FollowUpPolicy::default();
        let now = at(2026, 3, 1, 9);
        let pid = Uuid::new_v4();

        let high = policy.new_follow_up(pid, RiskLevel::High, now);
        assert_eq!(high.due_date, now + Duration::days(3));
        assert!(high.task_description.contains("Urgent"));

        let med = policy.new_follow_up(pid, RiskLevel::Med, now);
        assert_eq!(med.due_date, now + Duration::days(7));
        assert_eq!(med.task_description, "Routine follow-up for medium risk monitoring.");

        let low = policy.new_follow_up(pid, RiskLevel::Low, now);
        assert_eq!(low.due_date, now + Duration::days(30));
        assert_eq!(low.status, FollowUpStatus::Pending);
    }

    #[test]
    fn new_indicator_closes_then_creates() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        let policy = FollowUpPolicy::default();

        let first =
            on_new_indicator(&conn, &p.id, RiskLevel::High, &policy, at(2026, 3, 1, 9)).unwrap();
        assert_eq!(first.closed, 0);

        let second =
            on_new_indicator(&conn, &p.id, RiskLevel::Low, &policy, at(2026, 3, 2, 9)).unwrap();
        assert_eq!(second.closed, 1);

        let all = repository::get_follow_ups_for_patient(&conn, &p.id).unwrap();
        let pending: Vec<_> = all.iter().filter(|f| f.is_pending()).collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.follow_up.id);

        let old = repository::get_follow_up(&conn, &first.follow_up.id).unwrap().unwrap();
        assert_eq!(old.status, FollowUpStatus::Completed);
        assert_eq!(old.completed_at, Some(at(2026, 3, 2, 9)));
    }

    #[test]
    fn manual_complete_sets_timestamp() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        let policy = FollowUpPolicy::default();
        let t = on_new_indicator(&conn, &p.id, RiskLevel::Med, &policy, at(2026, 3, 1, 9)).unwrap();

        let updated = update_follow_up(
            &conn,
            &t.follow_up.id,
            FollowUpUpdate {
                status: Some(FollowUpStatus::Completed),
                ..Default::default()
            },
            at(2026, 3, 3, 10),
        )
        .unwrap();
        assert_eq!(updated.status, FollowUpStatus::Completed);
        assert_eq!(updated.completed_at, Some(at(2026, 3, 3, 10)));

        // Completing again keeps the first completion time
        let again = update_follow_up(
            &conn,
            &t.follow_up.id,
            FollowUpUpdate {
                status: Some(FollowUpStatus::Completed),
                ..Default::default()
            },
            at(2026, 3, 5, 10),
        )
        .unwrap();
        assert_eq!(again.completed_at, Some(at(2026, 3, 3, 10)));
    }

    #[test]
    fn reopening_rejected() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        let policy = FollowUpPolicy::default();
        let first =
            on_new_indicator(&conn, &p.id, RiskLevel::Med, &policy, at(2026, 3, 1, 9)).unwrap();
        on_new_indicator(&conn, &p.id, RiskLevel::Med, &policy, at(2026, 3, 2, 9)).unwrap();

        let result = update_follow_up(
            &conn,
            &first.follow_up.id,
            FollowUpUpdate {
                status: Some(FollowUpStatus::Pending),
                ..Default::default()
            },
            at(2026, 3, 3, 9),
        );
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn description_and_due_date_editable() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        let policy = FollowUpPolicy::default();
        let t = on_new_indicator(&conn, &p.id, RiskLevel::Low, &policy, at(2026, 3, 1, 9)).unwrap();

        let updated = update_follow_up(
            &conn,
            &t.follow_up.id,
            FollowUpUpdate {
                task_description: Some("  Call patient  ".into()),
                due_date: Some(at(2026, 3, 10, 9)),
                ..Default::default()
            },
            at(2026, 3, 2, 9),
        )
        .unwrap();
        assert_eq!(updated.task_description, "Call patient");
        assert_eq!(updated.due_date, at(2026, 3, 10, 9));
        assert!(updated.is_pending());

        let empty = update_follow_up(
            &conn,
            &t.follow_up.id,
            FollowUpUpdate {
                task_description: Some("   ".into()),
                ..Default::default()
            },
            at(2026, 3, 2, 9),
        );
        assert!(matches!(empty, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn edited_due_date_matches_stored_value() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        let policy = FollowUpPolicy::default();
        let t = on_new_indicator(&conn, &p.id, RiskLevel::Low, &policy, at(2026, 3, 1, 9)).unwrap();

        let updated = update_follow_up(
            &conn,
            &t.follow_up.id,
            FollowUpUpdate {
                due_date: Some(at(2026, 3, 10, 9) + Duration::milliseconds(250)),
                ..Default::default()
            },
            at(2026, 3, 2, 9),
        )
        .unwrap();
        assert_eq!(updated.due_date, at(2026, 3, 10, 9));

        let stored = repository::get_follow_up(&conn, &t.follow_up.id).unwrap().unwrap();
        assert_eq!(stored.due_date, updated.due_date);
    }

    #[test]
    fn update_unknown_is_not_found() {
        let conn = test_db();
        let result =
            update_follow_up(&conn, &Uuid::new_v4(), FollowUpUpdate::default(), at(2026, 3, 1, 9));
        assert!(matches!(result, Err(ServiceError::NotFound { entity_type: "follow_up", .. })));
    }
}
