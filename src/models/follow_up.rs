use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FollowUpStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub task_description: String,
    pub status: FollowUpStatus,
    pub due_date: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl FollowUp {
    pub fn is_pending(&self) -> bool {
        self.status == FollowUpStatus::Pending
    }
}

/// Manual edit of a follow-up task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FollowUpUpdate {
    pub status: Option<FollowUpStatus>,
    pub task_description: Option<String>,
    pub due_date: Option<NaiveDateTime>,
}
