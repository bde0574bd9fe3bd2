//! In-memory storage backend.
//!
//! Keeps the serialized board blob in memory, so loads and saves go through
//! the same JSON encoding as the file backend. Saves can be made to fail on
//! demand to exercise persistence-failure paths.

use crate::{
    domain::Board,
    error::{Result, TaskflowError},
    storage::Storage,
};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryStorageInner {
    blob: Option<String>,
    saves: usize,
    failures_pending: usize,
}

#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryStorageInner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `board`
    pub fn with_board(board: &Board) -> Result<Self> {
        let storage = Self::new();
        storage.lock().blob = Some(serde_json::to_string(board)?);
        Ok(storage)
    }

    /// Makes the next `count` saves fail with a persistence error
    pub fn fail_next_saves(&self, count: usize) {
        self.lock().failures_pending = count;
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// Decodes the stored blob, if any
    pub fn stored_board(&self) -> Result<Option<Board>> {
        match &self.lock().blob {
            Some(blob) => Ok(Some(serde_json::from_str(blob)?)),
            None => Ok(None),
        }
    }

    /// Replaces the raw blob, bypassing encoding
    pub fn put_raw(&self, blob: impl Into<String>) {
        self.lock().blob = Some(blob.into());
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStorageInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn initialize(&self) -> Result<()> {
        let empty = self.lock().blob.is_none();
        if empty {
            self.save_board(&Board::default()).await?;
        }
        Ok(())
    }

    async fn load_board(&self) -> Result<Option<Board>> {
        self.stored_board()
    }

    async fn save_board(&self, board: &Board) -> Result<()> {
        let blob = serde_json::to_string(board)?;

        let mut inner = self.lock();
        if inner.failures_pending > 0 {
            inner.failures_pending -= 1;
            return Err(TaskflowError::StorageError("simulated write failure".into()));
        }
        inner.blob = Some(blob);
        inner.saves += 1;
        Ok(())
    }

    async fn is_initialized(&self) -> bool {
        self.lock().blob.is_some()
    }
}
