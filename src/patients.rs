//! Patient registry: registration, lookup, detail and partial update.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository;
use crate::error::ServiceError;
use crate::models::{NewPatient, Page, Patient, PatientDetail, PatientUpdate};

const MAX_AGE: i32 = 150;
const MAX_NAME_LEN: usize = 200;

fn validate_name(name: &str) -> Result<String, ServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("Name is required"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::validation(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_age(age: i32) -> Result<i32, ServiceError> {
    if !(0..=MAX_AGE).contains(&age) {
        return Err(ServiceError::validation(format!(
            "Age must be between 0 and {MAX_AGE}"
        )));
    }
    Ok(age)
}

fn validate_gender(gender: &str) -> Result<String, ServiceError> {
    let trimmed = gender.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("Gender is required"));
    }
    Ok(trimmed.to_string())
}

fn normalize_contact(contact: Option<String>) -> Option<String> {
    contact
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

pub fn create_patient(
    conn: &Connection,
    new: NewPatient,
    now: NaiveDateTime,
) -> Result<Patient, ServiceError> {
    let patient = Patient {
        id: Uuid::new_v4(),
        name: validate_name(&new.name)?,
        age: validate_age(new.age)?,
        gender: validate_gender(&new.gender)?,
        contact_info: normalize_contact(new.contact_info),
        created_at: now,
    };
    repository::insert_patient(conn, &patient)?;
    tracing::info!(patient_id = %patient.id, "Patient registered");
    Ok(patient)
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Patient, ServiceError> {
    repository::get_patient(conn, id)?.ok_or_else(|| ServiceError::not_found("patient", id))
}

pub fn list_patients(conn: &Connection, page: &Page) -> Result<Vec<Patient>, ServiceError> {
    Ok(repository::list_patients(conn, page)?)
}

/// Patient with their indicators, assessments and follow-ups, each
/// fetched by patient id.
pub fn get_patient_detail(conn: &Connection, id: &Uuid) -> Result<PatientDetail, ServiceError> {
    let patient = get_patient(conn, id)?;
    Ok(PatientDetail {
        indicators: repository::get_indicators_for_patient(conn, id)?,
        assessments: repository::get_assessments_for_patient(conn, id)?,
        follow_ups: repository::get_follow_ups_for_patient(conn, id)?,
        patient,
    })
}

/// Apply only the fields present in `update`.
pub fn update_patient(
    conn: &Connection,
    id: &Uuid,
    update: PatientUpdate,
) -> Result<Patient, ServiceError> {
    let mut patient = get_patient(conn, id)?;
    if update.is_empty() {
        return Ok(patient);
    }

    if let Some(name) = update.name {
        patient.name = validate_name(&name)?;
    }
    if let Some(age) = update.age {
        patient.age = validate_age(age)?;
    }
    if let Some(gender) = update.gender {
        patient.gender = validate_gender(&gender)?;
    }
    if update.contact_info.is_some() {
        patient.contact_info = normalize_contact(update.contact_info);
    }

    repository::update_patient(conn, &patient)?;
    Ok(patient)
}
