//! `POST /indicators`: record a reading and run the risk pipeline.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::intake::{self, IndicatorSubmission};
use crate::models::NewIndicator;

pub async fn submit(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewIndicator>, JsonRejection>,
) -> Result<(StatusCode, Json<IndicatorSubmission>), ApiError> {
    let Json(new) = payload?;
    let config = &ctx.core.config;
    let mut conn = ctx.core.open_db()?;

    let submission = intake::submit_indicator(
        &mut conn,
        new,
        &config.risk,
        &config.follow_up,
        ctx.core.now(),
    )?;

    Ok((StatusCode::CREATED, Json(submission)))
}
