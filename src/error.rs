use thiserror::Error;

use crate::db::DatabaseError;

/// Errors surfaced by the domain services. Every variant is terminal for
/// the request that triggered it; nothing is retried.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Persistence failure: {0}")]
    Persistence(DatabaseError),
}

impl ServiceError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => ServiceError::NotFound {
                entity_type: entity_label(&entity_type),
                id,
            },
            DatabaseError::ConstraintViolation(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Persistence(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        ServiceError::Persistence(DatabaseError::Sqlite(err))
    }
}

fn entity_label(entity_type: &str) -> &'static str {
    match entity_type {
        "patient" => "patient",
        "follow_up" => "follow_up",
        "user" => "user",
        _ => "entity",
    }
}
