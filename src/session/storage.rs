// Session persistence

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Persisted credential pair
///
/// `user` is the serialized profile JSON; it is decoded by the session store
/// so corrupted values can be treated as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub user: String,
}

/// Key-value persistence for the session credential
pub trait SessionStorage: Send + Sync {
    /// Load the stored pair; `None` unless both halves are present
    fn load(&self) -> Result<Option<StoredSession>>;

    /// Store token and user together
    fn save(&self, session: &StoredSession) -> Result<()>;

    /// Remove both values
    fn clear(&self) -> Result<()>;
}

/// In-process storage, lost when the process exits
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entry: Mutex<Option<StoredSession>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a session, as if written by a previous run
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            entry: Mutex::new(Some(session)),
        }
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self
            .entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// SQLite-backed storage
///
/// Values live in a `session_kv` table. Saving and clearing run inside a
/// single transaction, so a crash can never leave the token without its user.
pub struct SqliteSessionStorage {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqliteSessionStorage {
    /// Open (or create) the session database
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create session directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite database: {}", path.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS session_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to create session table")?;

        tracing::debug!("Session storage opened: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM session_kv WHERE key = ?",
        [key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("Failed to read '{}' from session storage", key))
}

impl SessionStorage for SqliteSessionStorage {
    fn load(&self) -> Result<Option<StoredSession>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);

        let token = read_value(&conn, TOKEN_KEY)?;
        let user = read_value(&conn, USER_KEY)?;

        Ok(match (token, user) {
            (Some(token), Some(user)) => Some(StoredSession { token, user }),
            _ => None,
        })
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);

        let tx = conn
            .transaction()
            .context("Failed to begin session transaction")?;
        // User first: a token is never visible without its profile
        for (key, value) in [(USER_KEY, &session.user), (TOKEN_KEY, &session.token)] {
            tx.execute(
                "INSERT INTO session_kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .with_context(|| format!("Failed to write '{}' to session storage", key))?;
        }
        tx.commit().context("Failed to commit session")?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);

        let tx = conn
            .transaction()
            .context("Failed to begin session transaction")?;
        tx.execute(
            "DELETE FROM session_kv WHERE key IN (?1, ?2)",
            params![TOKEN_KEY, USER_KEY],
        )
        .context("Failed to clear session storage")?;
        tx.commit().context("Failed to commit session clear")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoredSession {
        StoredSession {
            token: "tok-1".to_string(),
            user: r#"{"id":"u-1","email":"alice@example.com","created_at":"2025-01-12T10:30:00Z"}"#
                .to_string(),
        }
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemorySessionStorage::new();
        assert_eq!(storage.load().unwrap(), None);

        storage.save(&sample()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(sample()));

        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_sqlite_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.sqlite3");

        {
            let storage = SqliteSessionStorage::open(&path).unwrap();
            assert_eq!(storage.load().unwrap(), None);
            storage.save(&sample()).unwrap();
        }

        let storage = SqliteSessionStorage::open(&path).unwrap();
        assert_eq!(storage.path(), path.as_path());
        assert_eq!(storage.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_sqlite_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteSessionStorage::open(&dir.path().join("s.db")).unwrap();

        storage.save(&sample()).unwrap();
        let updated = StoredSession {
            token: "tok-2".to_string(),
            ..sample()
        };
        storage.save(&updated).unwrap();

        assert_eq!(storage.load().unwrap(), Some(updated));
    }

    #[test]
    fn test_sqlite_clear_removes_both() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteSessionStorage::open(&dir.path().join("s.db")).unwrap();

        storage.save(&sample()).unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);

        // Clearing an empty store is fine
        storage.clear().unwrap();
    }

    #[test]
    fn test_sqlite_token_without_user_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteSessionStorage::open(&dir.path().join("s.db")).unwrap();

        {
            let conn = storage.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO session_kv (key, value) VALUES ('token', 'orphan')",
                [],
            )
            .unwrap();
        }

        assert_eq!(storage.load().unwrap(), None);
    }
}
