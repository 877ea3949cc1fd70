//! Todo record data model
//!
//! Records live in a flat collection; hierarchy is expressed through
//! `parent_id` on the child and `subtasks` on the parent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completion label, always derived from `TodoRecord::completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

impl Status {
    pub fn from_completed(completed: bool) -> Self {
        if completed {
            Status::Completed
        } else {
            Status::Pending
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pending => write!(f, "pending"),
            Status::Completed => write!(f, "completed"),
        }
    }
}

/// A single todo entry, possibly a subtask of another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoRecord {
    /// Unique identifier (prefix-xxxxxx)
    pub id: String,

    /// Task text with markup characters escaped
    pub task: String,

    /// Task text as entered (trimmed)
    #[serde(default)]
    pub original_task: String,

    /// Due date, free text
    #[serde(default)]
    pub due_date: Option<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub status: Status,

    /// Ordered child ids
    #[serde(default)]
    pub subtasks: Vec<String>,

    /// Stored for display; never used for ordering
    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub parent_id: Option<String>,

    /// Whether subtasks are shown under this record
    #[serde(default, rename = "isExpanded")]
    pub expanded: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl TodoRecord {
    /// Create a pending record. `task` is trimmed and escaped.
    pub fn new(id: String, task: &str, due_date: Option<&str>) -> Self {
        let now = Utc::now();
        let original = task.trim().to_string();
        Self {
            id,
            task: escape_markup(&original),
            original_task: original,
            due_date: normalize_due_date(due_date),
            completed: false,
            status: Status::Pending,
            subtasks: Vec::new(),
            priority: 0,
            parent_id: None,
            expanded: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the task text
    pub fn set_task(&mut self, task: &str) {
        self.original_task = task.trim().to_string();
        self.task = escape_markup(&self.original_task);
        self.touch();
    }

    /// Set completion and keep the status label in sync
    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
        self.status = Status::from_completed(completed);
        self.touch();
    }

    pub fn has_subtasks(&self) -> bool {
        !self.subtasks.is_empty()
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Case-insensitive substring match over task text and due date.
    /// `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.original_task.to_lowercase().contains(needle)
            || self.task.to_lowercase().contains(needle)
            || self
                .due_date
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }

    /// Refresh the updated timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Display for TodoRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.id, self.status, self.original_task)?;
        if let Some(ref due) = self.due_date {
            write!(f, " (due {})", due)?;
        }
        Ok(())
    }
}

fn normalize_due_date(due_date: Option<&str>) -> Option<String> {
    due_date
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Escape `& < > " '` as HTML entities
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
