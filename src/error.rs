use thiserror::Error;

pub type Result<T> = std::result::Result<T, TaskflowError>;

#[derive(Debug, Error)]
pub enum TaskflowError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Task {task} not found in section {section}")]
    TaskNotFound { section: String, task: String },

    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Reorder does not match current contents: {0}")]
    ReorderMismatch(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Invalid board: {0}")]
    InvalidBoard(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Session refresh failed: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl TaskflowError {
    /// True for contract violations the board itself rejects
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::SectionNotFound(_)
                | Self::TaskNotFound { .. }
                | Self::IndexOutOfRange { .. }
                | Self::ReorderMismatch(_)
                | Self::DuplicateId(_)
        )
    }
}
