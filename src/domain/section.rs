use crate::error::TaskflowError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Unique identifier for a section (column)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Generates a fresh random id
    pub fn generate() -> Self {
        Self(format!("section-{}", Uuid::new_v4().simple()))
    }

    /// Placeholder status for tasks not yet placed in a section
    pub(crate) fn unassigned() -> Self {
        Self(String::new())
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SectionId {
    type Err = TaskflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TaskflowError::Validation(
                "section id must not be empty".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for SectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A column on the board. `order` is a sort key and need not be contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub order: f64,
}

impl Section {
    pub fn new(id: SectionId, title: impl Into<String>, order: f64) -> Self {
        Self {
            id,
            title: title.into(),
            order,
        }
    }

    /// Best-effort classification derived from the title
    pub fn category(&self) -> SectionCategory {
        SectionCategory::classify(&self.title)
    }
}

/// Coarse workflow stage guessed from a section title.
///
/// This is a heuristic: a renamed section may be misclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionCategory {
    Todo,
    InProgress,
    Done,
}

impl SectionCategory {
    pub fn classify(title: &str) -> Self {
        let title = title.to_lowercase();
        if title.contains("done") || title.contains("complete") {
            Self::Done
        } else if title.contains("progress") || title.contains("doing") {
            Self::InProgress
        } else {
            Self::Todo
        }
    }
}

impl fmt::Display for SectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Todo => write!(f, "To Do"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Done => write!(f, "Done"),
        }
    }
}
