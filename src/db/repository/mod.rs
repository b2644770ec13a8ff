//! Repository layer: entity-scoped database operations.
//!
//! Every query is keyed explicitly by id or foreign id; callers never
//! walk relationships implicitly. Functions take `&Connection`, so they
//! work equally on a plain connection or inside a `Transaction`.

mod assessment;
mod follow_up;
mod indicator;
mod patient;
mod user;

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::DATETIME_FORMAT;

pub use assessment::*;
pub use follow_up::*;
pub use indicator::*;
pub use patient::*;
pub use user::*;

/// Format a timestamp for storage.
pub(crate) fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_datetime(idx: usize, s: &str) -> Result<NaiveDateTime, rusqlite::Error> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_uuid(idx: usize, s: &str) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_enum<T>(idx: usize, s: &str) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr<Err = super::DatabaseError>,
{
    T::from_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
