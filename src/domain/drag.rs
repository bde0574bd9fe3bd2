//! Turns drag-and-drop gestures into board commands.

use crate::domain::board::Board;
use crate::domain::command::BoardCommand;
use crate::domain::ordering::move_item;
use crate::domain::section::SectionId;
use crate::domain::task::TaskId;
use crate::error::{Result, TaskflowError};
use serde::{Deserialize, Serialize};

/// Container id used for the board-level section list
pub const BOARD_CONTAINER: &str = "board";

/// What was dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragItem {
    Section,
    Task,
}

/// A container plus a position inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropLocation {
    pub container_id: String,
    pub index: usize,
}

impl DropLocation {
    pub fn new(container_id: impl Into<String>, index: usize) -> Self {
        Self {
            container_id: container_id.into(),
            index,
        }
    }
}

/// Outcome of a finished drag gesture. `destination` is `None` when the item
/// was dropped outside any target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragResult {
    pub item: DragItem,
    pub source: DropLocation,
    pub destination: Option<DropLocation>,
}

impl DragResult {
    pub fn section(from: usize, to: Option<usize>) -> Self {
        Self {
            item: DragItem::Section,
            source: DropLocation::new(BOARD_CONTAINER, from),
            destination: to.map(|index| DropLocation::new(BOARD_CONTAINER, index)),
        }
    }

    pub fn task(source: DropLocation, destination: Option<DropLocation>) -> Self {
        Self {
            item: DragItem::Task,
            source,
            destination,
        }
    }

    /// Dropped nowhere, or back where it started
    pub fn is_noop(&self) -> bool {
        match &self.destination {
            None => true,
            Some(dest) => dest == &self.source,
        }
    }
}

/// Resolves a drag gesture to at most one board command.
///
/// Returns `Ok(None)` for a drop outside any target or onto the starting
/// position. Section drags index into the display order; task drags index
/// into the section's task list.
pub fn resolve(board: &Board, drag: &DragResult) -> Result<Option<BoardCommand>> {
    let dest = match &drag.destination {
        Some(dest) if !drag.is_noop() => dest,
        _ => return Ok(None),
    };

    let command = match drag.item {
        DragItem::Section => {
            let mut order: Vec<SectionId> = board
                .ordered_sections()
                .iter()
                .map(|s| s.id.clone())
                .collect();
            move_item(&mut order, drag.source.index, dest.index)?;
            BoardCommand::ReorderSections { order }
        }
        DragItem::Task => {
            let source_id: SectionId = drag.source.container_id.as_str().into();
            let dest_id: SectionId = dest.container_id.as_str().into();
            if !board.contains_section(&source_id) {
                return Err(TaskflowError::SectionNotFound(source_id.to_string()));
            }

            if source_id == dest_id {
                let mut order: Vec<TaskId> = board
                    .tasks(&source_id)
                    .iter()
                    .map(|t| t.id.clone())
                    .collect();
                move_item(&mut order, drag.source.index, dest.index)?;
                BoardCommand::ReorderTasks {
                    section_id: source_id,
                    order,
                }
            } else {
                BoardCommand::MoveTask {
                    source: source_id,
                    dest: dest_id,
                    source_index: drag.source.index,
                    dest_index: dest.index,
                }
            }
        }
    };

    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::board::tests::sample_board;

    #[test]
    fn test_drop_outside_is_noop() {
        let board = sample_board();
        let drag = DragResult::task(DropLocation::new("A", 0), None);
        assert_eq!(resolve(&board, &drag).unwrap(), None);
        assert_eq!(resolve(&board, &DragResult::section(0, None)).unwrap(), None);
    }

    #[test]
    fn test_same_position_is_noop() {
        let board = sample_board();
        let drag = DragResult::task(DropLocation::new("A", 1), Some(DropLocation::new("A", 1)));
        assert_eq!(resolve(&board, &drag).unwrap(), None);
        assert_eq!(resolve(&board, &DragResult::section(1, Some(1))).unwrap(), None);
    }

    #[test]
    fn test_section_drag_reorders_display_order() {
        let board = Board::default();
        let command = resolve(&board, &DragResult::section(2, Some(0)))
            .unwrap()
            .unwrap();
        assert_eq!(
            command,
            BoardCommand::ReorderSections {
                order: vec!["section-3".into(), "section-1".into(), "section-2".into()],
            }
        );

        let next = board.apply(&command).unwrap();
        let titles: Vec<&str> = next
            .ordered_sections()
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Done", "To Do", "In Progress"]);
    }

    #[test]
    fn test_task_drag_within_section() {
        let board = sample_board();
        let drag = DragResult::task(DropLocation::new("A", 0), Some(DropLocation::new("A", 2)));
        let command = resolve(&board, &drag).unwrap().unwrap();
        assert_eq!(
            command,
            BoardCommand::ReorderTasks {
                section_id: "A".into(),
                order: vec!["t2".into(), "t3".into(), "t1".into()],
            }
        );
    }

    #[test]
    fn test_task_drag_across_sections() {
        let board = sample_board();
        let drag = DragResult::task(DropLocation::new("A", 1), Some(DropLocation::new("B", 0)));
        let command = resolve(&board, &drag).unwrap().unwrap();
        assert_eq!(
            command,
            BoardCommand::MoveTask {
                source: "A".into(),
                dest: "B".into(),
                source_index: 1,
                dest_index: 0,
            }
        );
        // The board itself is untouched until the command is applied
        assert_eq!(board.tasks(&"A".into()).len(), 3);
    }

    #[test]
    fn test_invalid_source_index() {
        let board = sample_board();
        let drag = DragResult::task(DropLocation::new("B", 5), Some(DropLocation::new("B", 0)));
        assert!(matches!(
            resolve(&board, &drag).unwrap_err(),
            TaskflowError::IndexOutOfRange { .. }
        ));
    }

    #[test]
    fn test_unknown_source_section() {
        let board = sample_board();
        let drag = DragResult::task(DropLocation::new("Z", 0), Some(DropLocation::new("A", 0)));
        assert!(matches!(
            resolve(&board, &drag).unwrap_err(),
            TaskflowError::SectionNotFound(_)
        ));
    }
}
