use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::User;

use super::{fmt_datetime, parse_datetime, parse_uuid};

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, password_hash, full_name, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id.to_string(),
            user.username,
            user.password_hash,
            user.full_name,
            user.is_active as i32,
            fmt_datetime(&user.created_at),
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            DatabaseError::ConstraintViolation(format!("username {} already exists", user.username))
        }
        other => DatabaseError::from(other),
    })?;
    Ok(())
}

pub fn get_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, DatabaseError> {
    conn.query_row(
        "SELECT id, username, password_hash, full_name, is_active, created_at
         FROM users WHERE username = ?1",
        params![username],
        |row| {
            let id_str: String = row.get(0)?;
            let active: i32 = row.get(4)?;
            let created_str: String = row.get(5)?;
            Ok(User {
                id: parse_uuid(0, &id_str)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                full_name: row.get(3)?,
                is_active: active != 0,
                created_at: parse_datetime(5, &created_str)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}
