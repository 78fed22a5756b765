//! Persistence layer: the task repository port and its `SQLite` adapter.

pub mod db;
pub mod schema;
pub mod task_repo;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::models::task::{DueTask, DueTaskQuery};
use crate::Result;

/// Narrow, typed view of the task store used by the notification pipeline.
///
/// Exposes exactly the due-task query and the `last_notified_at` stamp.
/// Everything else about tasks and users is owned by the task board.
pub trait TaskRepository: Send + Sync {
    /// Return tasks matching `query`, each joined with its assignee.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DataAccess`](crate::AppError::DataAccess) if the
    /// underlying store fails.
    fn find_due(
        &self,
        query: DueTaskQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DueTask>>> + Send + '_>>;

    /// Set `last_notified_at = at` on one task.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DataAccess`](crate::AppError::DataAccess) if the
    /// update fails, or [`AppError::NotFound`](crate::AppError::NotFound) if
    /// the task no longer exists.
    fn mark_notified<'a>(
        &'a self,
        task_id: &'a str,
        at: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
