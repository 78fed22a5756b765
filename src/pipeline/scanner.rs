//! Due-task scanner.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::task::{DueTask, DueTaskQuery};
use crate::persistence::TaskRepository;
use crate::Result;

/// Whether an entry belongs in the scan result for `query`.
///
/// Excludes finished tasks, tasks without an assignee, and deadlines
/// outside the window.
#[must_use]
pub fn is_due_within(entry: &DueTask, query: &DueTaskQuery) -> bool {
    !entry.task.status.is_done()
        && entry.task.assignee_id.is_some()
        && query.contains(entry.task.due_at)
}

/// Fetch every unfinished, assigned task due in `[now, now + lookahead]`.
///
/// # Errors
///
/// Returns `AppError::DataAccess` if the repository query fails. The
/// caller treats this as fatal for the run.
pub async fn scan(
    repo: &dyn TaskRepository,
    now: DateTime<Utc>,
    lookahead: chrono::Duration,
) -> Result<Vec<DueTask>> {
    let query = DueTaskQuery::starting_at(now, lookahead);
    let rows = repo.find_due(query).await?;
    let fetched = rows.len();

    let due: Vec<DueTask> = rows
        .into_iter()
        .filter(|entry| is_due_within(entry, &query))
        .collect();

    if due.len() != fetched {
        debug!(
            fetched,
            kept = due.len(),
            "repository returned rows outside the due window"
        );
    }
    Ok(due)
}
