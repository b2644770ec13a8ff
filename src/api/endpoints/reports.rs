//! `GET /dashboard`: population summary.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::reporting::{self, DashboardSummary, DEFAULT_DASHBOARD_WEEKS};

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub weeks: Option<u32>,
}

pub async fn dashboard(
    State(ctx): State<ApiContext>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let Query(query) = query?;
    let weeks = query.weeks.unwrap_or(DEFAULT_DASHBOARD_WEEKS);
    let conn = ctx.core.open_db()?;
    Ok(Json(reporting::dashboard_summary(&conn, weeks, ctx.core.now())?))
}
