//! SQLite-backed credential store.

use super::CredentialStore;
use crate::{LabError, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Users table in a single SQLite file.
///
/// The connection sits behind `Arc<Mutex<_>>`, so every write in this process
/// is serialized; registration additionally runs inside an immediate
/// transaction and the `username` column is `UNIQUE`.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCredentialStore {
    /// Open (or create) the store at `db_path`.
    pub fn open_at(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| LabError::Io {
                    message: format!(
                        "Failed to create database directory: {}",
                        parent.display()
                    ),
                    source: Some(e),
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::configure_connection(&conn)?;
        Self::ensure_schema(&conn)?;
        debug!("Credential store opened at {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;\n\
             PRAGMA busy_timeout={};\n\
             PRAGMA synchronous=NORMAL;",
            BUSY_TIMEOUT_MS,
        ))?;
        Ok(())
    }

    fn ensure_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| LabError::Database {
            message: "Failed to acquire credential store lock".to_string(),
            source: None,
        })
    }

    fn user_exists(conn: &Connection, username: &str) -> Result<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn exists(&self, username: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        Self::user_exists(&conn, username)
    }

    fn register(&self, username: &str, password_hash: &str) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if Self::user_exists(&tx, username)? {
            return Err(LabError::UserExists {
                username: username.to_string(),
            });
        }

        let now = Utc::now().to_rfc3339();
        if let Err(e) = tx.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, now],
        ) {
            error!("Failed to register user {}: {}", username, e);
            return Err(e.into());
        }
        tx.commit()?;

        debug!("Registered user {}", username);
        Ok(())
    }

    fn authenticate(&self, username: &str, password_hash: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1 AND password_hash = ?2",
                params![username, password_hash],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}
