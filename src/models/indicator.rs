use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One vital-sign reading. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthIndicator {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub systolic: i32,
    pub diastolic: i32,
    /// mmol/L
    pub glucose: f64,
    pub recorded_at: NaiveDateTime,
}

/// Submission payload. `recorded_at` defaults to the processing time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewIndicator {
    pub patient_id: Uuid,
    #[serde(alias = "blood_pressure_sys")]
    pub systolic: i32,
    #[serde(alias = "blood_pressure_dia")]
    pub diastolic: i32,
    pub glucose: f64,
    #[serde(default)]
    pub recorded_at: Option<NaiveDateTime>,
}
