//! Per-task notification results and the run summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Urgency band for the time-remaining badge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Three hours or less remaining.
    Red,
    /// Twelve hours or less remaining.
    Amber,
    /// More than twelve hours remaining.
    Green,
}

impl Severity {
    /// Classify a rounded hours-left value.
    #[must_use]
    pub fn from_hours_left(hours_left: i64) -> Self {
        if hours_left <= 3 {
            Self::Red
        } else if hours_left <= 12 {
            Self::Amber
        } else {
            Self::Green
        }
    }

    /// CSS color used for the badge.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Red => "#dc2626",
            Self::Amber => "#f59e0b",
            Self::Green => "#16a34a",
        }
    }
}

/// What happened to one eligible task during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum NotificationOutcome {
    /// Email accepted by the delivery service and task stamped.
    Sent {
        /// Delivery confirmation id.
        delivery_id: String,
    },
    /// Delivery or the follow-up stamp failed.
    Failed {
        /// Error detail.
        error: String,
        /// Set when the email went out but the stamp failed.
        delivery_id: Option<String>,
    },
    /// No delivery attempted.
    Skipped {
        /// Why the task was skipped.
        reason: String,
    },
}

/// Result line for one task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskNotificationResult {
    /// Task the result refers to.
    pub task_id: String,
    /// Rounded hours until the deadline at run time.
    pub hours_left: i64,
    /// Outcome of the attempt.
    #[serde(flatten)]
    pub outcome: NotificationOutcome,
}

/// The observable report of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    /// Identifier for log correlation.
    pub run_id: String,
    /// The `now` the run evaluated against.
    pub run_at: DateTime<Utc>,
    /// Tasks returned by the scanner.
    pub scanned: usize,
    /// Tasks left after the cooldown filter.
    pub eligible: usize,
    /// Count of `sent` results.
    pub sent: usize,
    /// Count of `failed` results.
    pub failed: usize,
    /// Count of `skipped` results.
    pub skipped: usize,
    /// Per-task results in processing order.
    pub results: Vec<TaskNotificationResult>,
}

impl RunSummary {
    /// Start an empty summary for a run at `run_at`.
    #[must_use]
    pub fn new(run_at: DateTime<Utc>, scanned: usize, eligible: usize) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            run_at,
            scanned,
            eligible,
            sent: 0,
            failed: 0,
            skipped: 0,
            results: Vec::with_capacity(eligible),
        }
    }

    /// Append a result and bump the matching counter.
    pub fn record(&mut self, result: TaskNotificationResult) {
        match result.outcome {
            NotificationOutcome::Sent { .. } => self.sent += 1,
            NotificationOutcome::Failed { .. } => self.failed += 1,
            NotificationOutcome::Skipped { .. } => self.skipped += 1,
        }
        self.results.push(result);
    }
}
