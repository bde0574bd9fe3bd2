use crate::domain::board::Board;
use crate::domain::section::SectionId;
use crate::domain::task::{Task, TaskId, TaskPatch};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A board-changing operation.
///
/// Commands carry every generated id up front, so applying the same command
/// to the same board always yields the same result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardCommand {
    AddSection {
        id: SectionId,
        title: String,
    },
    UpdateSection {
        id: SectionId,
        title: String,
    },
    DeleteSection {
        id: SectionId,
    },
    ReorderSections {
        order: Vec<SectionId>,
    },
    AddTask {
        section_id: SectionId,
        task: Task,
    },
    UpdateTask {
        section_id: SectionId,
        task_id: TaskId,
        patch: TaskPatch,
    },
    DeleteTask {
        section_id: SectionId,
        task_id: TaskId,
    },
    MoveTask {
        source: SectionId,
        dest: SectionId,
        source_index: usize,
        dest_index: usize,
    },
    ReorderTasks {
        section_id: SectionId,
        order: Vec<TaskId>,
    },
}

impl BoardCommand {
    /// Add-section command with a freshly generated id
    pub fn add_section(title: impl Into<String>) -> Self {
        Self::AddSection {
            id: SectionId::generate(),
            title: title.into(),
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddSection { .. } => "add_section",
            Self::UpdateSection { .. } => "update_section",
            Self::DeleteSection { .. } => "delete_section",
            Self::ReorderSections { .. } => "reorder_sections",
            Self::AddTask { .. } => "add_task",
            Self::UpdateTask { .. } => "update_task",
            Self::DeleteTask { .. } => "delete_task",
            Self::MoveTask { .. } => "move_task",
            Self::ReorderTasks { .. } => "reorder_tasks",
        }
    }
}

impl fmt::Display for BoardCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddSection { id, .. }
            | Self::UpdateSection { id, .. }
            | Self::DeleteSection { id } => write!(f, "{} {}", self.name(), id),
            Self::ReorderSections { order } => {
                write!(f, "{} ({} sections)", self.name(), order.len())
            }
            Self::AddTask { section_id, task } => {
                write!(f, "{} {} -> {}", self.name(), task.id, section_id)
            }
            Self::UpdateTask {
                section_id,
                task_id,
                ..
            }
            | Self::DeleteTask {
                section_id,
                task_id,
            } => write!(f, "{} {} in {}", self.name(), task_id, section_id),
            Self::MoveTask {
                source,
                dest,
                source_index,
                dest_index,
            } => write!(
                f,
                "{} {}[{}] -> {}[{}]",
                self.name(),
                source,
                source_index,
                dest,
                dest_index
            ),
            Self::ReorderTasks { section_id, order } => {
                write!(f, "{} {} ({} tasks)", self.name(), section_id, order.len())
            }
        }
    }
}

impl Board {
    /// Runs one command against this board
    pub fn apply(&self, command: &BoardCommand) -> Result<Board> {
        match command {
            BoardCommand::AddSection { id, title } => self.add_section_with_id(id.clone(), title),
            BoardCommand::UpdateSection { id, title } => self.update_section(id, title),
            BoardCommand::DeleteSection { id } => self.delete_section(id),
            BoardCommand::ReorderSections { order } => self.reorder_sections(order),
            BoardCommand::AddTask { section_id, task } => self.add_task(section_id, task.clone()),
            BoardCommand::UpdateTask {
                section_id,
                task_id,
                patch,
            } => self.update_task(section_id, task_id, patch),
            BoardCommand::DeleteTask {
                section_id,
                task_id,
            } => self.delete_task(section_id, task_id),
            BoardCommand::MoveTask {
                source,
                dest,
                source_index,
                dest_index,
            } => self.move_task(source, dest, *source_index, *dest_index),
            BoardCommand::ReorderTasks { section_id, order } => {
                self.reorder_tasks(section_id, order)
            }
        }
    }
}
