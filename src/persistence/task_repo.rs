//! Task repository for `SQLite` persistence.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::task::{DueTask, DueTaskQuery, Task, TaskPriority, TaskStatus};
use crate::models::user::Assignee;
use crate::{AppError, Result};

use super::db::Database;
use super::TaskRepository;

/// Repository wrapper around `SQLite` for task and user records.
#[derive(Clone)]
pub struct SqliteTaskRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    due_at: String,
    assignee_id: Option<String>,
    last_notified_at: Option<String>,
}

impl TaskRow {
    /// Convert a database row into the domain model.
    fn into_task(self) -> Result<Task> {
        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status: parse_status(&self.status)?,
            priority: parse_priority(&self.priority)?,
            due_at: parse_timestamp("due_at", &self.due_at)?,
            assignee_id: self.assignee_id,
            last_notified_at: self
                .last_notified_at
                .as_deref()
                .map(|raw| parse_timestamp("last_notified_at", raw))
                .transpose()?,
        })
    }
}

/// Task row joined with its assignee columns.
#[derive(sqlx::FromRow)]
struct DueTaskRow {
    #[sqlx(flatten)]
    task: TaskRow,
    user_id: String,
    email: Option<String>,
    display_name: Option<String>,
}

impl DueTaskRow {
    fn into_due_task(self) -> Result<DueTask> {
        Ok(DueTask {
            task: self.task.into_task()?,
            assignee: Assignee {
                id: self.user_id,
                email: self.email,
                display_name: self.display_name,
            },
        })
    }
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AppError::DataAccess(format!("invalid {field}: {e}")))
}

/// Fixed-width UTC form used for every timestamp this crate writes.
fn timestamp_str(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_status(s: &str) -> Result<TaskStatus> {
    match s {
        "todo" => Ok(TaskStatus::Todo),
        "in_progress" => Ok(TaskStatus::InProgress),
        "review" => Ok(TaskStatus::Review),
        "done" => Ok(TaskStatus::Done),
        other => Err(AppError::DataAccess(format!("invalid task status: {other}"))),
    }
}

fn status_str(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Todo => "todo",
        TaskStatus::InProgress => "in_progress",
        TaskStatus::Review => "review",
        TaskStatus::Done => "done",
    }
}

fn parse_priority(s: &str) -> Result<TaskPriority> {
    match s {
        "low" => Ok(TaskPriority::Low),
        "medium" => Ok(TaskPriority::Medium),
        "high" => Ok(TaskPriority::High),
        "urgent" => Ok(TaskPriority::Urgent),
        other => Err(AppError::DataAccess(format!(
            "invalid task priority: {other}"
        ))),
    }
}

fn priority_str(p: TaskPriority) -> &'static str {
    match p {
        TaskPriority::Low => "low",
        TaskPriority::Medium => "medium",
        TaskPriority::High => "high",
        TaskPriority::Urgent => "urgent",
    }
}

impl SqliteTaskRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace a user record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DataAccess` if the write fails.
    pub async fn upsert_user(&self, user: &Assignee) -> Result<()> {
        sqlx::query(
            "INSERT INTO app_user (id, email, display_name) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET email = excluded.email,
             display_name = excluded.display_name",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    /// Insert a new task record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DataAccess` if the insert fails.
    pub async fn create_task(&self, task: &Task) -> Result<Task> {
        sqlx::query(
            "INSERT INTO task (id, title, description, status, priority, due_at,
             assignee_id, last_notified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(status_str(task.status))
        .bind(priority_str(task.priority))
        .bind(timestamp_str(task.due_at))
        .bind(&task.assignee_id)
        .bind(task.last_notified_at.map(timestamp_str))
        .execute(self.db.as_ref())
        .await?;

        Ok(task.clone())
    }

    /// Retrieve a task by its ID.
    ///
    /// Returns `Ok(None)` if the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DataAccess` if the query fails.
    pub async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM task WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(TaskRow::into_task).transpose()
    }

    async fn query_due(&self, query: DueTaskQuery) -> Result<Vec<DueTask>> {
        let rows: Vec<DueTaskRow> = sqlx::query_as(
            "SELECT t.id, t.title, t.description, t.status, t.priority, t.due_at,
                    t.assignee_id, t.last_notified_at,
                    u.id AS user_id, u.email, u.display_name
             FROM task t
             INNER JOIN app_user u ON u.id = t.assignee_id
             WHERE t.status != 'done'
               AND t.assignee_id IS NOT NULL
               AND julianday(t.due_at) BETWEEN julianday(?1) AND julianday(?2)
             ORDER BY julianday(t.due_at) ASC",
        )
        .bind(timestamp_str(query.window_start))
        .bind(timestamp_str(query.window_end))
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(DueTaskRow::into_due_task).collect()
    }

    async fn stamp_notified(&self, task_id: &str, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE task SET last_notified_at = ?1 WHERE id = ?2")
            .bind(timestamp_str(at))
            .bind(task_id)
            .execute(self.db.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("task {task_id}")));
        }
        Ok(())
    }
}

impl TaskRepository for SqliteTaskRepo {
    fn find_due(
        &self,
        query: DueTaskQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DueTask>>> + Send + '_>> {
        Box::pin(self.query_due(query))
    }

    fn mark_notified<'a>(
        &'a self,
        task_id: &'a str,
        at: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.stamp_notified(task_id, at))
    }
}
