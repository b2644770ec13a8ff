use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FollowUp, HealthIndicator, RiskAssessment};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub contact_info: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub age: i32,
    pub gender: String,
    #[serde(default)]
    pub contact_info: Option<String>,
}

/// Partial update: only fields present in the request are changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub contact_info: Option<String>,
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.contact_info.is_none()
    }
}

/// A patient with every record they own, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: Patient,
    pub indicators: Vec<HealthIndicator>,
    pub assessments: Vec<RiskAssessment>,
    pub follow_ups: Vec<FollowUp>,
}
