//! Schema migrations for the settings database.
//!
//! Each migration is a SQL file compiled into the binary and applied once,
//! inside its own transaction. Applied names are recorded in
//! `_avatar_migrations`.

use rusqlite::Connection;
use std::collections::HashSet;
use thiserror::Error;

/// `(name, sql)` in application order. Append only.
const MIGRATIONS: &[(&str, &str)] = &[
    ("000_settings", include_str!("migrations/000_settings.sql")),
];

const BOOTSTRAP: &str = "CREATE TABLE IF NOT EXISTS _avatar_migrations (
    name TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to create migration table: {0}")]
    Bootstrap(#[source] rusqlite::Error),

    #[error("failed to read applied migrations: {0}")]
    State(#[source] rusqlite::Error),

    #[error("migration '{name}' failed: {source}")]
    Apply {
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

/// Brings the schema up to date and returns how many migrations ran.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    apply(conn, MIGRATIONS)
}

/// Names of the migrations already recorded, in the order they ran.
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>, MigrationError> {
    conn.execute_batch(BOOTSTRAP).map_err(MigrationError::Bootstrap)?;
    let mut stmt = conn
        .prepare("SELECT name FROM _avatar_migrations ORDER BY applied_at, rowid")
        .map_err(MigrationError::State)?;
    let names = stmt
        .query_map([], |row| row.get(0))
        .and_then(|rows| rows.collect::<Result<Vec<String>, _>>())
        .map_err(MigrationError::State)?;
    Ok(names)
}

fn apply(conn: &Connection, migrations: &[(&'static str, &str)]) -> Result<usize, MigrationError> {
    let done: HashSet<String> = applied_migrations(conn)?.into_iter().collect();
    let pending: Vec<_> = migrations
        .iter()
        .filter(|(name, _)| !done.contains(*name))
        .collect();

    for &&(name, sql) in &pending {
        tracing::info!(migration = name, "applying settings migration");
        apply_one(conn, name, sql).map_err(|source| MigrationError::Apply { name, source })?;
    }
    Ok(pending.len())
}

fn apply_one(conn: &Connection, name: &str, sql: &str) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    tx.execute("INSERT INTO _avatar_migrations (name) VALUES (?1)", [name])?;
    tx.commit()
}
