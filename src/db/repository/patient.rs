use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Page, Patient};

use super::{fmt_datetime, parse_datetime, parse_uuid};

const PATIENT_COLUMNS: &str = "id, name, age, gender, contact_info, created_at";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, age, gender, contact_info, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.age,
            patient.gender,
            patient.contact_info,
            fmt_datetime(&patient.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    conn.query_row(&sql, params![id.to_string()], row_to_patient)
        .optional()
        .map_err(DatabaseError::from)
}

/// Whether a patient row exists, without loading it.
pub fn patient_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM patients WHERE id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// List patients in registration order.
pub fn list_patients(conn: &Connection, page: &Page) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients
         ORDER BY created_at ASC, rowid ASC
         LIMIT ?1 OFFSET ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![page.effective_limit(), page.skip],
        row_to_patient,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Every patient, for aggregation.
pub fn all_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], row_to_patient)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Overwrite the mutable columns of an existing patient.
pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE patients SET name = ?2, age = ?3, gender = ?4, contact_info = ?5
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.name,
            patient.age,
            patient.gender,
            patient.contact_info,
        ],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: patient.id.to_string(),
        });
    }
    Ok(())
}

fn row_to_patient(row: &rusqlite::Row) -> Result<Patient, rusqlite::Error> {
    let id_str: String = row.get(0)?;
    let created_str: String = row.get(5)?;

    Ok(Patient {
        id: parse_uuid(0, &id_str)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        contact_info: row.get(4)?,
        created_at: parse_datetime(5, &created_str)?,
    })
}
