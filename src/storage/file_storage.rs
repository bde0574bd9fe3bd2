use crate::{
    config::{StorageConfig, TaskflowConfig},
    domain::Board,
    error::Result,
    storage::Storage,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-based storage implementation
pub struct FileStorage {
    root_path: PathBuf,
    board_file: String,
}

impl FileStorage {
    const TASKFLOW_DIR: &'static str = ".taskflow";
    const CONFIG_FILE: &'static str = "config.toml";

    /// Creates a new FileStorage instance for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self::with_config(project_root, &StorageConfig::default())
    }

    pub fn with_config(project_root: impl AsRef<Path>, config: &StorageConfig) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::TASKFLOW_DIR),
            board_file: config.board_file.clone(),
        }
    }

    /// Reads `config.toml` from the data directory and builds storage from it
    pub fn open(project_root: impl AsRef<Path>) -> Result<(Self, TaskflowConfig)> {
        let root = project_root.as_ref();
        let config =
            TaskflowConfig::load(root.join(Self::TASKFLOW_DIR).join(Self::CONFIG_FILE))?;
        Ok((Self::with_config(root, &config.storage), config))
    }

    pub fn board_file(&self) -> PathBuf {
        self.root_path.join(&self.board_file)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root_path.join(Self::CONFIG_FILE)
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    /// Writes to a temp file in the same directory, then renames over the
    /// target so readers never see a half-written board.
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let temp_file = tempfile::NamedTempFile::new_in(parent)?;
        let temp_path = temp_file.path().to_path_buf();

        fs::write(&temp_path, data).await?;
        fs::rename(&temp_path, path).await?;

        tracing::debug!("Atomically wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        if !self.board_file().exists() {
            self.save_board(&Board::default()).await?;
            tracing::info!("Created starter board at {}", self.board_file().display());
        }

        Ok(())
    }

    async fn load_board(&self) -> Result<Option<Board>> {
        let board_file = self.board_file();

        if !board_file.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&board_file).await?;
        let board: Board = serde_json::from_str(&contents)?;

        tracing::debug!(
            "Loaded {} sections and {} tasks from {}",
            board.sections().len(),
            board.task_count(),
            board_file.display()
        );
        Ok(Some(board))
    }

    async fn save_board(&self, board: &Board) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        let json = serde_json::to_string_pretty(board)?;
        self.write_atomic(&self.board_file(), json.as_bytes()).await
    }

    async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.board_file().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SectionId, Task};
    use crate::error::TaskflowError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_storage_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(!storage.is_initialized().await);

        storage.initialize().await.unwrap();

        assert!(storage.is_initialized().await);
        assert_eq!(storage.load_board().await.unwrap(), Some(Board::default()));
    }

    #[tokio::test]
    async fn test_initialize_keeps_existing_board() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        let board = Board::default().add_section("Review").unwrap();
        storage.save_board(&board).await.unwrap();
        storage.initialize().await.unwrap();

        assert_eq!(storage.load_board().await.unwrap(), Some(board));
    }

    #[tokio::test]
    async fn test_load_missing_board() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        assert_eq!(storage.load_board().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_board_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        let board = Board::default()
            .add_task(
                &SectionId::from("section-2"),
                Task::new("Ship it").with_description("release build"),
            )
            .unwrap();
        storage.save_board(&board).await.unwrap();

        let loaded = storage.load_board().await.unwrap().unwrap();
        assert_eq!(loaded, board);
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.save_board(&Board::default()).await.unwrap();
        let smaller = Board::default()
            .delete_section(&SectionId::from("section-3"))
            .unwrap();
        storage.save_board(&smaller).await.unwrap();

        let loaded = storage.load_board().await.unwrap().unwrap();
        assert_eq!(loaded.sections().len(), 2);
    }

    #[tokio::test]
    async fn test_load_rejects_corrupt_board() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        std::fs::write(
            storage.board_file(),
            r#"{"sections":[],"tasks":{"ghost":[]}}"#,
        )
        .unwrap();

        let err = storage.load_board().await.unwrap_err();
        assert!(matches!(err, TaskflowError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_open_reads_config() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(".taskflow");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.toml"),
            "[storage]\nboard_file = \"kanban.json\"\n",
        )
        .unwrap();

        let (storage, config) = FileStorage::open(temp_dir.path()).unwrap();
        assert_eq!(config.storage.board_file, "kanban.json");
        assert_eq!(storage.config_file(), dir.join("config.toml"));

        storage.initialize().await.unwrap();
        assert!(dir.join("kanban.json").exists());
    }
}
