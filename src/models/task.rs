//! Task model as seen by the notification pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Assignee;

/// Board column a task currently sits in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Being worked on.
    InProgress,
    /// Awaiting review.
    Review,
    /// Finished; terminal.
    Done,
}

impl TaskStatus {
    /// Whether the task has reached its terminal state.
    #[must_use]
    pub fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Task priority as set on the board.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
    /// Urgent priority.
    Urgent,
}

impl TaskPriority {
    /// Human-readable label used in notification bodies.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

/// Task record. Owned by the task board; the pipeline only writes
/// `last_notified_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    /// Unique record identifier; immutable.
    pub id: String,
    /// Short task title.
    pub title: String,
    /// Optional long-form description.
    pub description: Option<String>,
    /// Current board status.
    pub status: TaskStatus,
    /// Priority level.
    pub priority: TaskPriority,
    /// Deadline.
    pub due_at: DateTime<Utc>,
    /// Assigned user, if any.
    pub assignee_id: Option<String>,
    /// Time of the last successful deadline notification.
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Construct a new `todo` task with a generated identifier.
    #[must_use]
    pub fn new(title: String, due_at: DateTime<Utc>, assignee_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_at,
            assignee_id,
            last_notified_at: None,
        }
    }
}

/// A due task joined with its assignee record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DueTask {
    /// The task itself.
    pub task: Task,
    /// The user the task is assigned to.
    pub assignee: Assignee,
}

/// Typed filter for the due-task query.
///
/// Matches tasks that are not `done`, have an assignee, and whose
/// `due_at` lies in `[window_start, window_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTaskQuery {
    /// Inclusive lower bound on `due_at`.
    pub window_start: DateTime<Utc>,
    /// Inclusive upper bound on `due_at`.
    pub window_end: DateTime<Utc>,
}

impl DueTaskQuery {
    /// Build the query for a lookahead window starting at `now`.
    #[must_use]
    pub fn starting_at(now: DateTime<Utc>, lookahead: chrono::Duration) -> Self {
        Self {
            window_start: now,
            window_end: now + lookahead,
        }
    }

    /// Whether `due_at` falls inside the window.
    #[must_use]
    pub fn contains(&self, due_at: DateTime<Utc>) -> bool {
        self.window_start <= due_at && due_at <= self.window_end
    }
}
