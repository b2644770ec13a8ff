//! Shared application state for the HTTP transport and the CLI.
//!
//! `CoreState` owns the configuration and the in-memory token registry.
//! Database connections are opened per operation from the configured
//! path; nothing else is shared between requests.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};

use crate::auth::TokenRegistry;
use crate::config::AppConfig;
use crate::db;

pub struct CoreState {
    pub config: AppConfig,
    tokens: Mutex<TokenRegistry>,
}

impl CoreState {
    pub fn new(config: AppConfig) -> Self {
        let ttl = Duration::from_secs(config.auth.token_ttl_minutes.saturating_mul(60));
        Self {
            config,
            tokens: Mutex::new(TokenRegistry::new(ttl)),
        }
    }

    /// Open a database connection at the configured path, applying any
    /// pending migrations.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.config.db_path).map_err(CoreError::Database)
    }

    pub fn tokens(&self) -> Result<MutexGuard<'_, TokenRegistry>, CoreError> {
        self.tokens.lock().map_err(|_| CoreError::LockPoisoned)
    }

    /// Current UTC time at the storage resolution (whole seconds).
    pub fn now(&self) -> NaiveDateTime {
        now()
    }
}

/// Current UTC time truncated to whole seconds, matching what the store
/// round-trips.
pub fn now() -> NaiveDateTime {
    db::storage_precision(Utc::now().naive_utc())
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn open_db_creates_schema() {
        let tmp = tempfile::tempdir().unwrap();
        let core = CoreState::new(AppConfig::with_db_path(tmp.path().join("nested/cht.db")));
        let conn = core.open_db().unwrap();
        assert_eq!(db::sqlite::count_tables(&conn).unwrap(), 6);
    }

    #[test]
    fn token_ttl_taken_from_config() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::with_db_path(tmp.path().join("cht.db"));
        config.auth.token_ttl_minutes = 5;
        let core = CoreState::new(config);
        let issued = core.tokens().unwrap().issue("doctor1").unwrap();
        assert_eq!(issued.expires_in, 300);
    }

    #[test]
    fn now_has_no_subsecond_part() {
        assert_eq!(now().nanosecond(), 0);
    }
}
