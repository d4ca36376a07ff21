//! SQLite pool for the kiosk settings database.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;
use thiserror::Error;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Connection tuning for the settings database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a writer waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 4,
        }
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to open settings database pool: {0}")]
    Build(#[from] r2d2::Error),
}

/// Opens a pool on `db_path`, creating the file if needed.
///
/// Every connection is switched to WAL so the settings form can read while
/// the controller writes. `:memory:` is accepted, but each pooled connection
/// then has its own database; use a single connection for that.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let busy_timeout = Duration::from_millis(settings.busy_timeout_ms);
    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
        .with_init(move |conn| init_connection(conn, busy_timeout));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;
    tracing::debug!(path = db_path, max_size = settings.pool_max_size, "opened settings database");
    Ok(pool)
}

fn init_connection(conn: &mut Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;

    let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    match mode.to_ascii_lowercase().as_str() {
        "wal" | "memory" => Ok(()),
        other => Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("journal_mode is {other}, expected wal")),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pragma<T: rusqlite::types::FromSql>(pool: &DbPool, name: &str) -> T {
        let conn = pool.get().unwrap();
        conn.pragma_query_value(None, name, |row| row.get(0)).unwrap()
    }

    #[test]
    fn file_pool_is_wal_with_busy_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.db");
        let pool = create_pool(
            path.to_str().unwrap(),
            DbRuntimeSettings {
                busy_timeout_ms: 1_200,
                pool_max_size: 2,
            },
        )
        .unwrap();

        assert_eq!(pragma::<String>(&pool, "journal_mode"), "wal");
        assert_eq!(pragma::<i64>(&pool, "busy_timeout"), 1_200);
        assert_eq!(pool.max_size(), 2);
        assert!(path.exists());
    }

    #[test]
    fn memory_pool_opens() {
        let pool = create_pool(
            ":memory:",
            DbRuntimeSettings {
                pool_max_size: 1,
                ..DbRuntimeSettings::default()
            },
        )
        .unwrap();
        let mode = pragma::<String>(&pool, "journal_mode");
        assert!(mode == "memory" || mode == "wal", "journal_mode was {mode}");
    }
}
