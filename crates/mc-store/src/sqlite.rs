//! SQLite-backed account and provider stores.

use async_trait::async_trait;
use mc_types::{
    NewProvider, Provider, ProviderStore, ProviderStoreError, User, UserStore, UserStoreError,
};
use std::path::Path;
use std::sync::MutexGuard;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS providers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    cpu_free REAL NOT NULL CHECK (cpu_free >= 0 AND cpu_free <= 100),
    ram_free REAL NOT NULL CHECK (ram_free >= 0),
    status TEXT NOT NULL,
    ip_address TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_providers_name ON providers(name);
"#;

/// Single-connection SQLite store implementing both UserStore and ProviderStore.
pub struct SqliteStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        Self::init(rusqlite::Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::init(rusqlite::Connection::open_in_memory()?)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, rusqlite::Connection>, String> {
        self.conn
            .lock()
            .map_err(|e| format!("failed to acquire lock: {}", e))
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, ProviderStoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self.lock().map_err(ProviderStoreError::Other)?;
        f(&conn).map_err(|e| ProviderStoreError::Other(e.to_string()))
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn provider_from_row(row: &rusqlite::Row) -> Result<Provider, rusqlite::Error> {
    Ok(Provider {
        id: row.get(0)?,
        name: row.get(1)?,
        cpu_free: row.get(2)?,
        ram_free: row.get(3)?,
        status: row.get(4)?,
        ip_address: row.get(5)?,
    })
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, UserStoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        let conn = self.lock().map_err(UserStoreError::Other)?;
        match conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![username, password_hash, now],
        ) {
            Ok(_) => Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(UserStoreError::Duplicate(username.to_string()))
            }
            Err(e) => Err(UserStoreError::Other(e.to_string())),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserStoreError> {
        let conn = self.lock().map_err(UserStoreError::Other)?;
        let result = conn.query_row(
            "SELECT id, username, password_hash FROM users WHERE username = ?1",
            [username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                })
            },
        );
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(UserStoreError::Other(e.to_string())),
        }
    }
}

#[async_trait]
impl ProviderStore for SqliteStore {
    async fn insert_provider(&self, provider: NewProvider) -> Result<Provider, ProviderStoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO providers (name, cpu_free, ram_free, status, ip_address, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    provider.name,
                    provider.cpu_free,
                    provider.ram_free,
                    provider.status,
                    provider.ip_address,
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        Ok(Provider {
            id,
            name: provider.name,
            cpu_free: provider.cpu_free,
            ram_free: provider.ram_free,
            status: provider.status,
            ip_address: provider.ip_address,
        })
    }

    async fn list_providers(&self) -> Result<Vec<Provider>, ProviderStoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, cpu_free, ram_free, status, ip_address FROM providers ORDER BY id",
            )?;
            let rows = stmt.query_map([], provider_from_row)?;
            rows.collect()
        })
    }

    async fn get_provider(&self, id: i64) -> Result<Option<Provider>, ProviderStoreError> {
        self.with_conn(|conn| {
            let result = conn.query_row(
                "SELECT id, name, cpu_free, ram_free, status, ip_address FROM providers WHERE id = ?1",
                [id],
                provider_from_row,
            );
            match result {
                Ok(p) => Ok(Some(p)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unique_constraint_maps_to_duplicate() {
        let store = SqliteStore::open_in_memory().unwrap();
        let u = store.create_user("alice", "h1").await.unwrap();
        assert!(u.id > 0);
        let err = store.create_user("alice", "h2").await.unwrap_err();
        assert!(matches!(err, UserStoreError::Duplicate(_)));
        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, u.id);
        assert_eq!(found.password_hash, "h1");
        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn provider_round_trip_through_sqlite() {
        let store = SqliteStore::open_in_memory().unwrap();
        let p = store
            .insert_provider(NewProvider {
                name: "node-1".to_string(),
                cpu_free: 80.5,
                ram_free: 6.4,
                status: "normal".to_string(),
                ip_address: Some("10.0.0.1".to_string()),
            })
            .await
            .unwrap();
        let got = store.get_provider(p.id).await.unwrap().unwrap();
        assert_eq!(got, p);
        assert_eq!(store.list_providers().await.unwrap(), vec![p]);
        assert!(store.get_provider(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn check_constraints_reject_out_of_range_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .insert_provider(NewProvider {
                name: "bad".to_string(),
                cpu_free: 150.0,
                ram_free: 1.0,
                status: "normal".to_string(),
                ip_address: None,
            })
            .await;
        assert!(err.is_err());
        assert!(store.list_providers().await.unwrap().is_empty());
    }
}
