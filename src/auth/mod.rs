//! Staff accounts, password hashing and bearer tokens.

pub mod password;
pub mod tokens;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{repository, DatabaseError};
use crate::error::ServiceError;
use crate::models::{NewUser, User};

use password::verify_without_hash;
pub use password::{hash_password, verify_password};
pub use tokens::{IssuedToken, TokenRegistry};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Invalid access token")]
    InvalidToken,

    #[error("Access token expired")]
    TokenExpired,

    #[error("Token lifetime out of range")]
    TtlOutOfRange,

    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

fn validate_username(username: &str) -> Result<String, ServiceError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("Username is required"));
    }
    if trimmed.len() > MAX_USERNAME_LEN {
        return Err(ServiceError::validation(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@'))
    {
        return Err(ServiceError::validation(
            "Username may only contain letters, digits and . _ - @",
        ));
    }
    Ok(trimmed.to_string())
}

/// Create a staff account. Duplicate usernames are a `Conflict`.
pub fn register_user(
    conn: &Connection,
    new: NewUser,
    iterations: u32,
    now: NaiveDateTime,
) -> Result<User, ServiceError> {
    let username = validate_username(&new.username)?;
    if new.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if repository::get_user_by_username(conn, &username)?.is_some() {
        return Err(ServiceError::Conflict("Username already registered".into()));
    }

    let user = User {
        id: Uuid::new_v4(),
        username,
        password_hash: hash_password(&new.password, iterations),
        full_name: new
            .full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        is_active: true,
        created_at: now,
    };
    repository::insert_user(conn, &user)?;
    tracing::info!(username = %user.username, "User registered");
    Ok(user)
}

/// Check a username/password pair. Unknown users, inactive users and
/// wrong passwords are indistinguishable to the caller, in both the error
/// returned and the PBKDF2 work done. `iterations` sizes the stand-in
/// derivation for unknown users.
pub fn authenticate(
    conn: &Connection,
    username: &str,
    password: &str,
    iterations: u32,
) -> Result<User, AuthError> {
    let Some(user) = repository::get_user_by_username(conn, username.trim())? else {
        verify_without_hash(password, iterations);
        return Err(AuthError::InvalidCredentials);
    };
    let matches = verify_password(password, &user.password_hash)?;
    if !matches || !user.is_active {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{at, test_db};

    const FAST: u32 = 1_000;

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password: password.into(),
            full_name: Some("Dr. Smith".into()),
        }
    }

    #[test]
    fn register_then_authenticate() {
        let conn = test_db();
        let new = new_user("doctor1", "correct horse");
        let user = register_user(&conn, new, FAST, at(2026, 3, 1, 9)).unwrap();
        assert_ne!(user.password_hash, "correct horse");

        let authed = authenticate(&conn, "doctor1", "correct horse", FAST).unwrap();
        assert_eq!(authed.id, user.id);
    }

    #[test]
    fn wrong_password_and_unknown_user_look_the_same() {
        let conn = test_db();
        register_user(&conn, new_user("doctor1", "correct horse"), FAST, at(2026, 3, 1, 9))
            .unwrap();

        assert!(matches!(
            authenticate(&conn, "doctor1", "wrong horse", FAST),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&conn, "nobody", "correct horse", FAST),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn duplicate_username_conflicts() {
        let conn = test_db();
        register_user(&conn, new_user("doctor1", "password1"), FAST, at(2026, 3, 1, 9)).unwrap();
        let again =
            register_user(&conn, new_user(" doctor1 ", "password2"), FAST, at(2026, 3, 1, 9));
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn weak_registration_rejected() {
        let conn = test_db();
        let now = at(2026, 3, 1, 9);
        assert!(matches!(
            register_user(&conn, new_user("", "password1"), FAST, now),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            register_user(&conn, new_user("doc tor", "password1"), FAST, now),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            register_user(&conn, new_user("doctor1", "short"), FAST, now),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn inactive_user_cannot_log_in() {
        let conn = test_db();
        register_user(&conn, new_user("doctor1", "password1"), FAST, at(2026, 3, 1, 9)).unwrap();
        conn.execute("UPDATE users SET is_active = 0 WHERE username = 'doctor1'", [])
            .unwrap();
        assert!(matches!(
            authenticate(&conn, "doctor1", "password1", FAST),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
