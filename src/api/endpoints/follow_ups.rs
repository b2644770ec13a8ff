//! Follow-up endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::follow_up;
use crate::models::{
    FollowUp, FollowUpFilter, FollowUpStatus, FollowUpUpdate, Page, DEFAULT_PAGE_LIMIT,
};

#[derive(Deserialize)]
pub struct FollowUpQuery {
    pub status: Option<FollowUpStatus>,
    pub patient_id: Option<Uuid>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl From<FollowUpQuery> for FollowUpFilter {
    fn from(q: FollowUpQuery) -> Self {
        FollowUpFilter {
            status: q.status,
            patient_id: q.patient_id,
            page: Page {
                skip: q.skip.unwrap_or(0),
                limit: q.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            },
        }
    }
}

/// `GET /followups`: filter by status and patient, ordered by due date.
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<FollowUpQuery>, QueryRejection>,
) -> Result<Json<Vec<FollowUp>>, ApiError> {
    let Query(query) = query?;
    let conn = ctx.core.open_db()?;
    Ok(Json(follow_up::list_follow_ups(&conn, &query.into())?))
}

/// `PATCH /followups/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<FollowUpUpdate>, JsonRejection>,
) -> Result<Json<FollowUp>, ApiError> {
    let id = parse_id(&id)?;
    let Json(update) = payload?;
    let conn = ctx.core.open_db()?;
    Ok(Json(follow_up::update_follow_up(&conn, &id, update, ctx.core.now())?))
}
