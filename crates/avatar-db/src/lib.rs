//! Settings database for the avatar kiosk.
//!
//! A pooled SQLite file in WAL mode holding one `settings` table, keyed by
//! profile scope and setting name. The schema is created and upgraded by the
//! embedded migrations in [`run_migrations`].

mod migrations;
mod pool;

pub use migrations::{applied_migrations, run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
