//! Account registration, token login and logout.
//!
//! Password hashing is CPU-bound, so both handlers run their work on the
//! blocking pool.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Form, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::middleware::auth::bearer_token;
use crate::api::types::{ApiContext, UserContext};
use crate::auth::{self, IssuedToken};
use crate::models::{NewUser, User};

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `POST /users`: register a staff account.
pub async fn register(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(new) = payload?;
    let core = ctx.core.clone();

    let user = tokio::task::spawn_blocking(move || -> Result<User, ApiError> {
        let conn = core.open_db()?;
        let iterations = core.config.auth.pbkdf2_iterations;
        Ok(auth::register_user(&conn, new, iterations, core.now())?)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /token`: exchange form credentials for a bearer token.
pub async fn login(
    State(ctx): State<ApiContext>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<IssuedToken>, ApiError> {
    let Form(form) = form?;
    let core = ctx.core.clone();

    let issued = tokio::task::spawn_blocking(move || -> Result<IssuedToken, ApiError> {
        let conn = core.open_db()?;
        let iterations = core.config.auth.pbkdf2_iterations;
        let user = auth::authenticate(&conn, &form.username, &form.password, iterations)
            .map_err(|err| {
                tracing::warn!(username = %form.username, error = %err, "Login failed");
                ApiError::from(err)
            })?;
        let issued = core.tokens()?.issue(&user.username)?;
        tracing::info!(username = %user.username, "Access token issued");
        Ok(issued)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(issued))
}

/// `POST /logout`: revoke the token the request was made with.
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<UserContext>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    if ctx.core.tokens()?.revoke(token) {
        tracing::info!(username = %user.username, "Access token revoked");
    }
    Ok(StatusCode::NO_CONTENT)
}
