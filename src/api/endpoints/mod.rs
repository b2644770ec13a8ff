//! API endpoint handlers.
//!
//! Handlers are thin: parse the request, open a connection, call the
//! domain service, shape the response.

pub mod auth;
pub mod follow_ups;
pub mod health;
pub mod indicators;
pub mod patients;
pub mod reports;

use uuid::Uuid;

use crate::api::error::ApiError;

/// Parse a path identifier, rejecting malformed ids with 400.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid ID format".into()))
}
