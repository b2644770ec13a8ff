//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it against the
//! token registry and injects `UserContext` into request extensions for
//! downstream handlers.

use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, UserContext};

/// The bearer token of a request, if it carries a non-empty one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Require a valid, unexpired access token.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(req.headers())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let username = {
        let mut tokens = ctx.core.tokens()?;
        tokens.validate(&token).map_err(|err| {
            tracing::warn!(error = %err, path = %req.uri().path(), "Rejected access token");
            ApiError::from(err)
        })?
    }; // MutexGuard dropped here, before any .await

    req.extensions_mut().insert(UserContext { username });

    Ok(next.run(req).await)
}
