use crate::{domain::Board, error::Result};
use async_trait::async_trait;

pub mod file_storage;
pub mod memory_storage;

#[cfg(feature = "sqlite-storage")]
pub mod sqlite_storage;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;

#[cfg(feature = "sqlite-storage")]
pub use sqlite_storage::SqliteStorage;

/// Storage key the board blob is kept under in key-value backends
pub const BOARD_KEY: &str = "taskflow_kanban";

/// Storage trait for persisting the whole board as one blob
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initializes the storage backend, writing the starter board if none exists
    async fn initialize(&self) -> Result<()>;

    /// Loads the board, or `None` if nothing has been saved yet
    async fn load_board(&self) -> Result<Option<Board>>;

    /// Replaces the stored board
    async fn save_board(&self, board: &Board) -> Result<()>;

    /// Checks if a board has been stored
    async fn is_initialized(&self) -> bool;
}
