use crate::domain::ordering::{display_order, move_item, next_order};
use crate::domain::section::{Section, SectionCategory, SectionId};
use crate::domain::task::{validate_title, Task, TaskId, TaskPatch};
use crate::error::{Result, TaskflowError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Persisted shape of a board: the section list plus task lists keyed by
/// section id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardData {
    pub sections: Vec<Section>,
    #[serde(default)]
    pub tasks: BTreeMap<SectionId, Vec<Task>>,
}

/// Kanban board state.
///
/// A `Board` is an immutable value: every operation borrows the current board
/// and returns a new one, leaving the original untouched when it fails.
/// Construction always goes through validation, so every task sits in exactly
/// one list and carries that list's section id as its `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoardData", into = "BoardData")]
pub struct Board {
    sections: Vec<Section>,
    tasks: HashMap<SectionId, Vec<Task>>,
}

/// Task counts by section category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
}

impl Board {
    /// Board with no sections
    pub fn empty() -> Self {
        Self {
            sections: Vec::new(),
            tasks: HashMap::new(),
        }
    }

    /// Builds a board from raw parts, checking every data-model invariant.
    ///
    /// Sections without a task list get an empty one.
    pub fn from_parts(
        sections: Vec<Section>,
        tasks: impl IntoIterator<Item = (SectionId, Vec<Task>)>,
    ) -> Result<Self> {
        let mut section_ids = HashSet::new();
        for section in &sections {
            if !section_ids.insert(section.id.clone()) {
                return Err(TaskflowError::DuplicateId(section.id.to_string()));
            }
        }

        let mut lists: HashMap<SectionId, Vec<Task>> = HashMap::new();
        let mut task_ids = HashSet::new();
        for (section_id, list) in tasks {
            if !section_ids.contains(&section_id) {
                return Err(TaskflowError::InvalidBoard(format!(
                    "tasks listed under unknown section {}",
                    section_id
                )));
            }
            for task in &list {
                if task.status != section_id {
                    return Err(TaskflowError::InvalidBoard(format!(
                        "task {} has status {} but is listed under {}",
                        task.id, task.status, section_id
                    )));
                }
                if !task_ids.insert(task.id.clone()) {
                    return Err(TaskflowError::DuplicateId(task.id.to_string()));
                }
            }
            lists.insert(section_id, list);
        }

        for section in &sections {
            lists.entry(section.id.clone()).or_default();
        }

        Ok(Self {
            sections,
            tasks: lists,
        })
    }

    /// Sections in stored order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Sections sorted by `order`, ties kept in stored order
    pub fn ordered_sections(&self) -> Vec<&Section> {
        display_order(&self.sections)
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    pub fn contains_section(&self, id: &SectionId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Tasks of a section in position order; empty for an unknown section
    pub fn tasks(&self, section_id: &SectionId) -> &[Task] {
        self.tasks
            .get(section_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Locates a task anywhere on the board
    pub fn find_task(&self, task_id: &TaskId) -> Option<(&SectionId, usize)> {
        self.tasks.iter().find_map(|(section_id, list)| {
            list.iter()
                .position(|t| &t.id == task_id)
                .map(|index| (section_id, index))
        })
    }

    pub fn task_count(&self) -> usize {
        self.tasks.values().map(Vec::len).sum()
    }

    /// Counts tasks by the category each section's title suggests
    pub fn stats(&self) -> BoardStats {
        let mut stats = BoardStats::default();
        for section in &self.sections {
            let count = self.tasks(&section.id).len();
            stats.total += count;
            match section.category() {
                SectionCategory::Done => stats.completed += count,
                SectionCategory::InProgress => stats.in_progress += count,
                SectionCategory::Todo => {}
            }
        }
        stats
    }

    /// Appends a section with a fresh id
    pub fn add_section(&self, title: &str) -> Result<Self> {
        self.add_section_with_id(SectionId::generate(), title)
    }

    /// Appends a section after the current maximum `order`
    pub fn add_section_with_id(&self, id: SectionId, title: &str) -> Result<Self> {
        let title = validate_title(title)?;
        if self.contains_section(&id) {
            return Err(TaskflowError::DuplicateId(id.to_string()));
        }

        let mut next = self.clone();
        let order = next_order(&next.sections);
        next.tasks.insert(id.clone(), Vec::new());
        next.sections.push(Section::new(id, title, order));
        Ok(next)
    }

    /// Renames a section, leaving its `order` alone
    pub fn update_section(&self, id: &SectionId, title: &str) -> Result<Self> {
        let index = self.section_index(id)?;
        let title = validate_title(title)?;

        let mut next = self.clone();
        next.sections[index].title = title;
        Ok(next)
    }

    /// Removes a section together with every task in it
    pub fn delete_section(&self, id: &SectionId) -> Result<Self> {
        let index = self.section_index(id)?;

        let mut next = self.clone();
        next.sections.remove(index);
        next.tasks.remove(id);
        Ok(next)
    }

    /// Rearranges sections into the given order and reassigns `order` to each
    /// section's position.
    ///
    /// `order` must name every current section exactly once. Passing the
    /// current display order returns the board unchanged.
    pub fn reorder_sections(&self, order: &[SectionId]) -> Result<Self> {
        if order.len() != self.sections.len() {
            return Err(TaskflowError::ReorderMismatch(format!(
                "expected {} sections, got {}",
                self.sections.len(),
                order.len()
            )));
        }

        let mut seen = HashSet::new();
        for id in order {
            if !self.contains_section(id) {
                return Err(TaskflowError::ReorderMismatch(format!(
                    "unknown section {}",
                    id
                )));
            }
            if !seen.insert(id) {
                return Err(TaskflowError::ReorderMismatch(format!(
                    "section {} listed twice",
                    id
                )));
            }
        }

        let unchanged = self
            .ordered_sections()
            .iter()
            .map(|s| &s.id)
            .eq(order.iter());
        if unchanged {
            return Ok(self.clone());
        }

        let mut next = self.clone();
        next.sections = order
            .iter()
            .enumerate()
            .filter_map(|(position, id)| {
                self.section(id).map(|section| Section {
                    order: position as f64,
                    ..section.clone()
                })
            })
            .collect();
        Ok(next)
    }

    /// Appends a task to a section, stamping its `status` with the section id
    pub fn add_task(&self, section_id: &SectionId, task: Task) -> Result<Self> {
        self.section_index(section_id)?;
        let title = validate_title(&task.title)?;
        if self.find_task(&task.id).is_some() {
            return Err(TaskflowError::DuplicateId(task.id.to_string()));
        }

        let mut next = self.clone();
        next.list_mut(section_id)?.push(Task {
            title,
            status: section_id.clone(),
            ..task
        });
        Ok(next)
    }

    /// Merges `patch` into a task, keeping its id and status
    pub fn update_task(
        &self,
        section_id: &SectionId,
        task_id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Self> {
        let index = self.task_index(section_id, task_id)?;
        let updated = self.tasks(section_id)[index].patched(patch)?;

        let mut next = self.clone();
        next.list_mut(section_id)?[index] = updated;
        Ok(next)
    }

    pub fn delete_task(&self, section_id: &SectionId, task_id: &TaskId) -> Result<Self> {
        let index = self.task_index(section_id, task_id)?;

        let mut next = self.clone();
        next.list_mut(section_id)?.remove(index);
        Ok(next)
    }

    /// Moves the task at `source_index` of one section to `dest_index` of
    /// another (or the same) section.
    ///
    /// `dest_index` is clamped to the destination length.
    pub fn move_task(
        &self,
        source: &SectionId,
        dest: &SectionId,
        source_index: usize,
        dest_index: usize,
    ) -> Result<Self> {
        self.section_index(source)?;
        self.section_index(dest)?;
        let len = self.tasks(source).len();
        if source_index >= len {
            return Err(TaskflowError::IndexOutOfRange {
                index: source_index,
                len,
            });
        }

        let mut next = self.clone();
        if source == dest {
            move_item(next.list_mut(source)?, source_index, dest_index)?;
            return Ok(next);
        }

        let mut task = next.list_mut(source)?.remove(source_index);
        task.status = dest.clone();
        let dest_list = next.list_mut(dest)?;
        let dest_index = dest_index.min(dest_list.len());
        dest_list.insert(dest_index, task);
        Ok(next)
    }

    /// Replaces a section's list with the same tasks in a new order.
    ///
    /// Tasks are looked up by id, so each keeps its current fields.
    pub fn reorder_tasks(&self, section_id: &SectionId, order: &[TaskId]) -> Result<Self> {
        self.section_index(section_id)?;
        let current = self.tasks(section_id);

        let mut expected: Vec<&TaskId> = current.iter().map(|t| &t.id).collect();
        let mut requested: Vec<&TaskId> = order.iter().collect();
        expected.sort();
        requested.sort();
        if expected != requested {
            return Err(TaskflowError::ReorderMismatch(format!(
                "task ids do not match the contents of section {}",
                section_id
            )));
        }

        let by_id: HashMap<&TaskId, &Task> = current.iter().map(|t| (&t.id, t)).collect();
        let reordered: Vec<Task> = order
            .iter()
            .filter_map(|id| by_id.get(id).map(|t| (*t).clone()))
            .collect();

        let mut next = self.clone();
        *next.list_mut(section_id)? = reordered;
        Ok(next)
    }

    fn section_index(&self, id: &SectionId) -> Result<usize> {
        self.sections
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| TaskflowError::SectionNotFound(id.to_string()))
    }

    fn task_index(&self, section_id: &SectionId, task_id: &TaskId) -> Result<usize> {
        self.section_index(section_id)?;
        self.tasks(section_id)
            .iter()
            .position(|t| &t.id == task_id)
            .ok_or_else(|| TaskflowError::TaskNotFound {
                section: section_id.to_string(),
                task: task_id.to_string(),
            })
    }

    fn list_mut(&mut self, section_id: &SectionId) -> Result<&mut Vec<Task>> {
        self.tasks
            .get_mut(section_id)
            .ok_or_else(|| TaskflowError::SectionNotFound(section_id.to_string()))
    }
}

impl Default for Board {
    /// The starter board: To Do, In Progress and Done, all empty
    fn default() -> Self {
        let sections = vec![
            Section::new("section-1".into(), "To Do", 0.0),
            Section::new("section-2".into(), "In Progress", 1.0),
            Section::new("section-3".into(), "Done", 2.0),
        ];
        let tasks = sections
            .iter()
            .map(|s| (s.id.clone(), Vec::new()))
            .collect();
        Self { sections, tasks }
    }
}

impl TryFrom<BoardData> for Board {
    type Error = TaskflowError;

    fn try_from(data: BoardData) -> Result<Self> {
        Self::from_parts(data.sections, data.tasks)
    }
}

impl From<Board> for BoardData {
    fn from(board: Board) -> Self {
        Self {
            sections: board.sections,
            tasks: board.tasks.into_iter().collect(),
        }
    }
}
