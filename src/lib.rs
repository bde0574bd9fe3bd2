//! # Taskflow Core
//!
//! State engine for a single-user kanban board.
//!
//! The crate holds the board model and its transitions, search filtering,
//! drag-and-drop resolution, the request/success/failure lifecycle that
//! couples board changes to persistence, and a scheduler that refreshes an
//! auth session before it expires. Rendering and the auth backend itself are
//! left to the embedding application.

pub mod config;
pub mod domain;
pub mod error;
pub mod mutation;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::{RefreshConfig, StorageConfig, TaskflowConfig};
pub use domain::{
    Board, BoardCommand, BoardStats, DragItem, DragResult, DropLocation, SearchSummary, Section,
    SectionCategory, SectionId, Task, TaskId, TaskPatch,
};
pub use error::{Result, TaskflowError};
pub use mutation::{BoardController, PendingMutation};
pub use session::{AuthProvider, Clock, RefreshTimer, Session, SessionRefreshScheduler};
pub use storage::Storage;
