use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository;
use crate::error::ServiceError;
use crate::models::RiskLevel;

use super::round_to;

pub const DEFAULT_TREND_DAYS: u32 = 30;
pub const MAX_TREND_DAYS: u32 = 3650;

/// Direction label, taken from the most recent assessment only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendStatus {
    Improving,
    Stable,
    Deteriorating,
}

impl TrendStatus {
    pub fn from_latest(level: Option<RiskLevel>) -> Self {
        match level {
            Some(RiskLevel::High) => TrendStatus::Deteriorating,
            Some(RiskLevel::Low) => TrendStatus::Improving,
            Some(RiskLevel::Med) | None => TrendStatus::Stable,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientTrend {
    pub patient_id: Uuid,
    pub period_days: u32,
    pub avg_sbp: f64,
    pub avg_dbp: f64,
    pub avg_glucose: f64,
    pub record_count: usize,
    pub status: TrendStatus,
}

/// Averages over the readings of the last `days` days.
///
/// `Ok(None)` means the patient exists but has no reading in the window.
pub fn patient_trend(
    conn: &Connection,
    patient_id: &Uuid,
    days: u32,
    now: NaiveDateTime,
) -> Result<Option<PatientTrend>, ServiceError> {
    if days == 0 || days > MAX_TREND_DAYS {
        return Err(ServiceError::validation(format!(
            "Trend window must be between 1 and {MAX_TREND_DAYS} days"
        )));
    }
    if !repository::patient_exists(conn, patient_id)? {
        return Err(ServiceError::not_found("patient", patient_id));
    }

    let since = now - Duration::days(i64::from(days));
    let indicators = repository::get_indicators_since(conn, patient_id, &since)?;
    if indicators.is_empty() {
        return Ok(None);
    }

    let n = indicators.len() as f64;
    let avg_sbp = indicators.iter().map(|i| f64::from(i.systolic)).sum::<f64>() / n;
    let avg_dbp = indicators.iter().map(|i| f64::from(i.diastolic)).sum::<f64>() / n;
    let avg_glucose = indicators.iter().map(|i| i.glucose).sum::<f64>() / n;

    let latest = repository::get_latest_assessment(conn, patient_id)?;

    Ok(Some(PatientTrend {
        patient_id: *patient_id,
        period_days: days,
        avg_sbp: round_to(avg_sbp, 1),
        avg_dbp: round_to(avg_dbp, 1),
        avg_glucose: round_to(avg_glucose, 2),
        record_count: indicators.len(),
        status: TrendStatus::from_latest(latest.map(|a| a.risk_level)),
    }))
}
