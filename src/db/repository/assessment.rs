use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{RiskAssessment, RiskLevel};

use super::{fmt_datetime, parse_datetime, parse_enum, parse_uuid};

pub fn insert_assessment(conn: &Connection, a: &RiskAssessment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO risk_assessments (id, patient_id, indicator_id, risk_level, assessed_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            a.id.to_string(),
            a.patient_id.to_string(),
            a.indicator_id.to_string(),
            a.risk_level.as_str(),
            fmt_datetime(&a.assessed_at),
            a.notes,
        ],
    )?;
    Ok(())
}

/// All assessments of a patient, newest first.
pub fn get_assessments_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<RiskAssessment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, indicator_id, risk_level, assessed_at, notes
         FROM risk_assessments
         WHERE patient_id = ?1
         ORDER BY assessed_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], row_to_assessment)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Most recent assessment of a patient. Ties on `assessed_at` go to the
/// row inserted last.
pub fn get_latest_assessment(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Option<RiskAssessment>, DatabaseError> {
    conn.query_row(
        "SELECT id, patient_id, indicator_id, risk_level, assessed_at, notes
         FROM risk_assessments
         WHERE patient_id = ?1
         ORDER BY assessed_at DESC, rowid DESC
         LIMIT 1",
        params![patient_id.to_string()],
        row_to_assessment,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Latest risk level per patient, for every patient with at least one
/// assessment.
pub fn get_latest_risk_levels(conn: &Connection) -> Result<Vec<(Uuid, RiskLevel)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT ra.patient_id, ra.risk_level
         FROM risk_assessments ra
         WHERE ra.rowid = (
             SELECT inner_ra.rowid FROM risk_assessments inner_ra
             WHERE inner_ra.patient_id = ra.patient_id
             ORDER BY inner_ra.assessed_at DESC, inner_ra.rowid DESC
             LIMIT 1
         )",
    )?;
    let rows = stmt.query_map([], |row| {
        let patient_str: String = row.get(0)?;
        let level_str: String = row.get(1)?;
        Ok((parse_uuid(0, &patient_str)?, parse_enum(1, &level_str)?))
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn row_to_assessment(row: &rusqlite::Row) -> Result<RiskAssessment, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let patient_str: String = row.get(1)?;
    let indicator_str: String = row.get(2)?;
    let level_str: String = row.get(3)?;
    let assessed_str: String = row.get(4)?;

    Ok(RiskAssessment {
        id: parse_uuid(0, &id_str)?,
        patient_id: parse_uuid(1, &patient_str)?,
        indicator_id: parse_uuid(2, &indicator_str)?,
        risk_level: parse_enum(3, &level_str)?,
        assessed_at: parse_datetime(4, &assessed_str)?,
        notes: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    use crate::db::repository::test_support::{at, seed_patient, test_db};
    use crate::db::repository::insert_indicator;
    use crate::models::HealthIndicator;

    fn seed_assessment(
        conn: &Connection,
        patient_id: Uuid,
        level: RiskLevel,
        assessed_at: NaiveDateTime,
    ) -> RiskAssessment {
        let indicator = HealthIndicator {
            id: Uuid::new_v4(),
            patient_id,
            systolic: 120,
            diastolic: 80,
            glucose: 5.0,
            recorded_at: assessed_at,
        };
        insert_indicator(conn, &indicator).unwrap();
        let a = RiskAssessment {
            id: Uuid::new_v4(),
            patient_id,
            indicator_id: indicator.id,
            risk_level: level,
            assessed_at,
            notes: Some("note".into()),
        };
        insert_assessment(conn, &a).unwrap();
        a
    }

    #[test]
    fn latest_assessment_by_date() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        seed_assessment(&conn, p.id, RiskLevel::High, at(2026, 3, 1, 8));
        seed_assessment(&conn, p.id, RiskLevel::Low, at(2026, 3, 9, 8));
        seed_assessment(&conn, p.id, RiskLevel::Med, at(2026, 3, 4, 8));

        let latest = get_latest_assessment(&conn, &p.id).unwrap().unwrap();
        assert_eq!(latest.risk_level, RiskLevel::Low);
    }

    #[test]
    fn same_timestamp_prefers_last_inserted() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        seed_assessment(&conn, p.id, RiskLevel::Low, at(2026, 3, 1, 8));
        seed_assessment(&conn, p.id, RiskLevel::High, at(2026, 3, 1, 8));

        let latest = get_latest_assessment(&conn, &p.id).unwrap().unwrap();
        assert_eq!(latest.risk_level, RiskLevel::High);
    }

    #[test]
    fn latest_none_without_assessments() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        assert!(get_latest_assessment(&conn, &p.id).unwrap().is_none());
    }

    #[test]
    fn latest_levels_one_row_per_patient() {
        let conn = test_db();
        let a = seed_patient(&conn, "A");
        let b = seed_patient(&conn, "B");
        seed_patient(&conn, "C");
        seed_assessment(&conn, a.id, RiskLevel::High, at(2026, 3, 1, 8));
        seed_assessment(&conn, a.id, RiskLevel::Med, at(2026, 3, 2, 8));
        seed_assessment(&conn, b.id, RiskLevel::Low, at(2026, 3, 1, 8));

        let mut levels = get_latest_risk_levels(&conn).unwrap();
        levels.sort_by_key(|(_, level)| level.as_str());
        assert_eq!(levels.len(), 2);
        assert!(levels.contains(&(a.id, RiskLevel::Med)));
        assert!(levels.contains(&(b.id, RiskLevel::Low)));
    }

    #[test]
    fn assessments_listed_newest_first() {
        let conn = test_db();
        let p = seed_patient(&conn, "A");
        seed_assessment(&conn, p.id, RiskLevel::Low, at(2026, 3, 1, 8));
        seed_assessment(&conn, p.id, RiskLevel::High, at(2026, 3, 2, 8));

        let all = get_assessments_for_patient(&conn, &p.id).unwrap();
        assert_eq!(all[0].risk_level, RiskLevel::High);
        assert_eq!(all[0].notes.as_deref(), Some("note"));
    }
}
