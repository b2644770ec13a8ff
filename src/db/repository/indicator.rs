use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::HealthIndicator;

use super::{fmt_datetime, parse_datetime, parse_uuid};

/// Insert a health indicator record.
pub fn insert_indicator(conn: &Connection, ind: &HealthIndicator) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO health_indicators (id, patient_id, systolic, diastolic, glucose, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            ind.id.to_string(),
            ind.patient_id.to_string(),
            ind.systolic,
            ind.diastolic,
            ind.glucose,
            fmt_datetime(&ind.recorded_at),
        ],
    )?;
    Ok(())
}

/// All indicators of a patient, newest first.
pub fn get_indicators_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<HealthIndicator>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, systolic, diastolic, glucose, recorded_at
         FROM health_indicators
         WHERE patient_id = ?1
         ORDER BY recorded_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], row_to_indicator)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Indicators of a patient recorded at or after `since`, oldest first.
pub fn get_indicators_since(
    conn: &Connection,
    patient_id: &Uuid,
    since: &NaiveDateTime,
) -> Result<Vec<HealthIndicator>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, systolic, diastolic, glucose, recorded_at
         FROM health_indicators
         WHERE patient_id = ?1 AND recorded_at >= ?2
         ORDER BY recorded_at ASC",
    )?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), fmt_datetime(since)],
        row_to_indicator,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_indicator(row: &rusqlite::Row) -> Result<HealthIndicator, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let patient_str: String = row.get(1)?;
    let recorded_str: String = row.get(5)?;

    Ok(HealthIndicator {
        id: parse_uuid(0, &id_str)?,
        patient_id: parse_uuid(1, &patient_str)?,
        systolic: row.get(2)?,
        diastolic: row.get(3)?,
        glucose: row.get(4)?,
        recorded_at: parse_datetime(5, &recorded_str)?,
    })
}
