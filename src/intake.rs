//! Indicator intake: validate a reading, store it, assess it and roll the
//! patient's follow-up forward, all inside one transaction.

use chrono::{Duration, NaiveDateTime};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, repository};
use crate::error::ServiceError;
use crate::follow_up::{self, FollowUpPolicy};
use crate::models::{FollowUp, HealthIndicator, NewIndicator, RiskAssessment};
use crate::risk::{self, RiskThresholds};

const SYSTOLIC_RANGE: std::ops::RangeInclusive<i32> = 40..=300;
const DIASTOLIC_RANGE: std::ops::RangeInclusive<i32> = 20..=200;
const GLUCOSE_RANGE: std::ops::RangeInclusive<f64> = 0.5..=60.0;
const FUTURE_TOLERANCE_MINUTES: i64 = 5;

/// Everything written for one submitted reading.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSubmission {
    pub indicator: HealthIndicator,
    pub assessment: RiskAssessment,
    pub follow_up: FollowUp,
    pub closed_follow_ups: usize,
}

/// Reject malformed readings before anything touches the store.
pub fn validate_indicator(new: &NewIndicator, now: NaiveDateTime) -> Result<(), ServiceError> {
    if !SYSTOLIC_RANGE.contains(&new.systolic) {
        return Err(ServiceError::validation(format!(
            "Systolic pressure must be between {} and {} mmHg",
            SYSTOLIC_RANGE.start(),
            SYSTOLIC_RANGE.end()
        )));
    }
    if !DIASTOLIC_RANGE.contains(&new.diastolic) {
        return Err(ServiceError::validation(format!(
            "Diastolic pressure must be between {} and {} mmHg",
            DIASTOLIC_RANGE.start(),
            DIASTOLIC_RANGE.end()
        )));
    }
    if new.diastolic >= new.systolic {
        return Err(ServiceError::validation(
            "Diastolic pressure must be lower than systolic pressure",
        ));
    }
    if !new.glucose.is_finite() || !GLUCOSE_RANGE.contains(&new.glucose) {
        return Err(ServiceError::validation(format!(
            "Glucose must be between {} and {} mmol/L",
            GLUCOSE_RANGE.start(),
            GLUCOSE_RANGE.end()
        )));
    }
    if let Some(recorded_at) = new.recorded_at {
        if recorded_at > now + Duration::minutes(FUTURE_TOLERANCE_MINUTES) {
            return Err(ServiceError::validation("Reading time is in the future"));
        }
    }
    Ok(())
}

/// Record a reading and drive the risk/follow-up pipeline.
///
/// All writes share one transaction: on any error the transaction is
/// dropped and rolled back, so no partial state survives. The write lock
/// is taken at BEGIN so concurrent submissions for a patient serialize
/// instead of each seeing the same pending follow-up.
pub fn submit_indicator(
    conn: &mut Connection,
    new: NewIndicator,
    thresholds: &RiskThresholds,
    policy: &FollowUpPolicy,
    now: NaiveDateTime,
) -> Result<IndicatorSubmission, ServiceError> {
    validate_indicator(&new, now)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if !repository::patient_exists(&tx, &new.patient_id)? {
        return Err(ServiceError::not_found("patient", new.patient_id));
    }

    let indicator = HealthIndicator {
        id: Uuid::new_v4(),
        patient_id: new.patient_id,
        systolic: new.systolic,
        diastolic: new.diastolic,
        glucose: new.glucose,
        recorded_at: db::storage_precision(new.recorded_at.unwrap_or(now)),
    };
    repository::insert_indicator(&tx, &indicator)?;

    let level = thresholds.classify(indicator.systolic, indicator.diastolic, indicator.glucose);
    let assessment = RiskAssessment {
        id: Uuid::new_v4(),
        patient_id: indicator.patient_id,
        indicator_id: indicator.id,
        risk_level: level,
        assessed_at: now,
        notes: Some(risk::rationale(
            indicator.systolic,
            indicator.diastolic,
            indicator.glucose,
        )),
    };
    repository::insert_assessment(&tx, &assessment)?;

    let transition = follow_up::on_new_indicator(&tx, &indicator.patient_id, level, policy, now)?;

    tx.commit()?;

    tracing::info!(
        patient_id = %indicator.patient_id,
        risk = %level,
        closed = transition.closed,
        "Indicator recorded"
    );

    Ok(IndicatorSubmission {
        indicator,
        assessment,
        follow_up: transition.follow_up,
        closed_follow_ups: transition.closed,
    })
}
