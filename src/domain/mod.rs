pub mod board;
pub mod command;
pub mod drag;
pub mod ordering;
pub mod search;
pub mod section;
pub mod task;

pub use board::{Board, BoardData, BoardStats};
pub use command::BoardCommand;
pub use drag::{resolve, DragItem, DragResult, DropLocation};
pub use search::{filter_tasks, SearchSummary};
pub use section::{Section, SectionCategory, SectionId};
pub use task::{Task, TaskId, TaskPatch};
