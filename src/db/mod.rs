pub mod sqlite;
pub mod repository;

pub use sqlite::*;
pub use repository::*;

use chrono::{NaiveDateTime, Timelike};
use thiserror::Error;

/// Timestamp format used for every TEXT datetime column.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Truncate to whole seconds, the resolution `DATETIME_FORMAT` keeps.
pub fn storage_precision(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
