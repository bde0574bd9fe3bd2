use crate::{
    domain::Board,
    error::{Result, TaskflowError},
    storage::{Storage, BOARD_KEY},
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed key-value store holding the board blob
pub struct SqliteStorage {
    connection: Mutex<Connection>,
}

fn storage_error(err: rusqlite::Error) -> TaskflowError {
    TaskflowError::StorageError(err.to_string())
}

impl SqliteStorage {
    /// Opens (or creates) a database file
    pub fn new(database_path: impl AsRef<Path>) -> Result<Self> {
        let connection = Connection::open(database_path).map_err(storage_error)?;
        Self::with_connection(connection)
    }

    /// Opens a throwaway in-memory database
    pub fn in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().map_err(storage_error)?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
                [],
            )
            .map_err(storage_error)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_blob(&self) -> Result<Option<String>> {
        self.lock()
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![BOARD_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage_error)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn initialize(&self) -> Result<()> {
        if self.read_blob()?.is_none() {
            self.save_board(&Board::default()).await?;
        }
        Ok(())
    }

    async fn load_board(&self) -> Result<Option<Board>> {
        match self.read_blob()? {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }

    async fn save_board(&self, board: &Board) -> Result<()> {
        let blob = serde_json::to_string(board)?;
        self.lock()
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![BOARD_KEY, blob],
            )
            .map_err(storage_error)?;
        tracing::debug!("Saved {} bytes under {}", blob.len(), BOARD_KEY);
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        matches!(self.read_blob(), Ok(Some(_)))
    }
}
