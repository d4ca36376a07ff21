//! Durable storage for kiosk settings.
//!
//! Every persisted field of [`SessionConfig`] lives under a fixed key. A
//! missing or empty stored value means "use the compiled-in default", so
//! clearing a key is how a field returns to its default.

use avatar_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings, MigrationError, PoolError};
use avatar_types::{SessionConfig, SessionDefaults};
use rusqlite::OptionalExtension;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Persisted configuration fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    BackgroundImage,
    AvatarId,
    Language,
    Emotion,
    ContextId,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::BackgroundImage,
        SettingKey::AvatarId,
        SettingKey::Language,
        SettingKey::Emotion,
        SettingKey::ContextId,
    ];

    /// The name the value is stored under.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::BackgroundImage => "avatarBackgroundImage",
            Self::AvatarId => "avatarIdOverride",
            Self::Language => "avatarLanguage",
            Self::Emotion => "avatarEmotion",
            Self::ContextId => "avatarContextId",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings database unavailable: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("failed to open settings database: {0}")]
    Open(#[from] PoolError),

    #[error("failed to migrate settings database: {0}")]
    Migration(#[from] MigrationError),

    #[error("settings query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Key-value storage for persisted settings.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: SettingKey) -> Result<Option<String>, StoreError>;
    fn set(&self, key: SettingKey, value: &str) -> Result<(), StoreError>;
    fn clear(&self, key: SettingKey) -> Result<(), StoreError>;

    /// Stores `value`, or clears the key when `value` is empty.
    fn set_or_clear(&self, key: SettingKey, value: &str) -> Result<(), StoreError> {
        if value.is_empty() {
            self.clear(key)
        } else {
            self.set(key, value)
        }
    }
}

/// Reads the persisted configuration, filling gaps from `defaults`.
pub fn load_session_config(
    store: &dyn SettingsStore,
    defaults: &SessionDefaults,
) -> Result<SessionConfig, StoreError> {
    let stored = |key| -> Result<Option<String>, StoreError> {
        Ok(store.get(key)?.filter(|value| !value.is_empty()))
    };

    let mut config = SessionConfig::from(defaults);
    if let Some(avatar_id) = stored(SettingKey::AvatarId)? {
        config.avatar_id = avatar_id;
    }
    if let Some(language) = stored(SettingKey::Language)? {
        config.language = language;
    }
    if let Some(emotion) = stored(SettingKey::Emotion)? {
        config.emotion = emotion;
    }
    if let Some(context_id) = stored(SettingKey::ContextId)? {
        config.context_id = context_id;
    }
    if let Some(image) = stored(SettingKey::BackgroundImage)? {
        config.background_image = Some(image);
    }
    Ok(config)
}

/// In-process store, for tests and hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: Mutex<HashMap<SettingKey, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: SettingKey) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(&key).cloned())
    }

    fn set(&self, key: SettingKey, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key, value.to_string());
        Ok(())
    }

    fn clear(&self, key: SettingKey) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(&key);
        Ok(())
    }
}

/// SQLite-backed store. Values are namespaced by `scope`, one per kiosk
/// profile.
#[derive(Debug, Clone)]
pub struct SqliteSettingsStore {
    pool: DbPool,
    scope: String,
}

impl SqliteSettingsStore {
    /// Wraps an already migrated pool.
    pub fn new(pool: DbPool, scope: impl Into<String>) -> Self {
        Self {
            pool,
            scope: scope.into(),
        }
    }

    /// Opens (creating if needed) the database at `path` and runs migrations.
    pub fn open(path: &str, scope: impl Into<String>) -> Result<Self, StoreError> {
        let pool = create_pool(path, DbRuntimeSettings::default())?;
        {
            let conn = pool.get()?;
            let applied = run_migrations(&conn)?;
            if applied > 0 {
                tracing::info!(count = applied, path, "applied settings migrations");
            }
        }
        Ok(Self::new(pool, scope))
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn get(&self, key: SettingKey) -> Result<Option<String>, StoreError> {
        let conn = self.pool.get()?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE scope = ?1 AND key = ?2",
                [self.scope.as_str(), key.storage_key()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: SettingKey, value: &str) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO settings (scope, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope, key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
            [self.scope.as_str(), key.storage_key(), value],
        )?;
        tracing::debug!(key = key.storage_key(), scope = %self.scope, "stored setting");
        Ok(())
    }

    fn clear(&self, key: SettingKey) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM settings WHERE scope = ?1 AND key = ?2",
            [self.scope.as_str(), key.storage_key()],
        )?;
        tracing::debug!(key = key.storage_key(), scope = %self.scope, "cleared setting");
        Ok(())
    }
}
