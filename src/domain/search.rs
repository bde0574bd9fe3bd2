//! Read-only task filtering for the board search box.

use crate::domain::board::Board;
use crate::domain::task::Task;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// True when `query` should narrow the view
pub fn is_active(query: &str) -> bool {
    !query.trim().is_empty()
}

/// Filters a section's tasks by a search query
///
/// A blank query returns the input slice itself (borrowed), which callers can
/// treat as "no filter active". Otherwise the result holds, in their original
/// order, the tasks whose title or description contains the query,
/// ignoring case.
///
/// # Examples
/// ```
/// use std::borrow::Cow;
/// use taskflow_core::domain::search::filter_tasks;
/// use taskflow_core::domain::task::Task;
///
/// let tasks = vec![Task::new("Fix login"), Task::new("Write docs")];
///
/// let hits = filter_tasks(&tasks, "LOGIN");
/// assert_eq!(hits.len(), 1);
///
/// assert!(matches!(filter_tasks(&tasks, "  "), Cow::Borrowed(_)));
/// ```
pub fn filter_tasks<'a>(tasks: &'a [Task], query: &str) -> Cow<'a, [Task]> {
    if !is_active(query) {
        return Cow::Borrowed(tasks);
    }

    let needle = query.to_lowercase();
    Cow::Owned(
        tasks
            .iter()
            .filter(|task| task.matches_lowercase(&needle))
            .cloned()
            .collect(),
    )
}

/// "Showing X of Y tasks" numbers for the whole board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub query: String,
    pub matching: usize,
    pub total: usize,
}

impl SearchSummary {
    pub fn for_board(board: &Board, query: &str) -> Self {
        let (matching, total) = board
            .sections()
            .iter()
            .map(|section| {
                let tasks = board.tasks(&section.id);
                (filter_tasks(tasks, query).len(), tasks.len())
            })
            .fold((0, 0), |(m, t), (sm, st)| (m + sm, t + st));

        Self {
            query: query.to_string(),
            matching,
            total,
        }
    }

    pub fn is_filtering(&self) -> bool {
        is_active(&self.query)
    }
}
