//! Patient endpoints.
//!
//! - `POST /patients`: register
//! - `GET /patients`: paginated list
//! - `GET /patients/:id`: detail with indicators, assessments, follow-ups
//! - `PUT /patients/:id`: partial update
//! - `GET /patients/:id/trend`: averages over a recent window

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{NewPatient, Page, Patient, PatientDetail, PatientUpdate};
use crate::patients;
use crate::reporting::{self, PatientTrend, DEFAULT_TREND_DAYS};

#[derive(Deserialize)]
pub struct TrendQuery {
    pub days: Option<u32>,
}

pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(new) = payload?;
    let conn = ctx.core.open_db()?;
    let patient = patients::create_patient(&conn, new, ctx.core.now())?;
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn list(
    State(ctx): State<ApiContext>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let Query(page) = page?;
    let conn = ctx.core.open_db()?;
    Ok(Json(patients::list_patients(&conn, &page)?))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<PatientDetail>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.open_db()?;
    Ok(Json(patients::get_patient_detail(&conn, &id)?))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<PatientUpdate>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&id)?;
    let Json(update) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(Json(patients::update_patient(&conn, &id, update)?))
}

pub async fn trend(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    query: Result<Query<TrendQuery>, QueryRejection>,
) -> Result<Json<PatientTrend>, ApiError> {
    let id = parse_id(&id)?;
    let Query(query) = query?;
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);

    let conn = ctx.core.open_db()?;
    reporting::patient_trend(&conn, &id, days, ctx.core.now())?
        .map(Json)
        .ok_or_else(|| ApiError::NoData(format!("No indicator data in the last {days} days")))
}
