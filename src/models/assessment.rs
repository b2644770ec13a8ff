use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RiskLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub indicator_id: Uuid,
    pub risk_level: RiskLevel,
    pub assessed_at: NaiveDateTime,
    pub notes: Option<String>,
}
