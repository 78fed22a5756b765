//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` — safe to
//! re-run on every startup against a store the task board already owns.

use sqlx::SqlitePool;

use crate::Result;

/// Apply the user and task table definitions.
///
/// # Errors
///
/// Returns `AppError::DataAccess` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS app_user (
    id              TEXT PRIMARY KEY NOT NULL,
    email           TEXT,
    display_name    TEXT
);

CREATE TABLE IF NOT EXISTS task (
    id              TEXT PRIMARY KEY NOT NULL,
    title           TEXT NOT NULL,
    description     TEXT,
    status          TEXT NOT NULL CHECK(status IN ('todo','in_progress','review','done')),
    priority        TEXT NOT NULL CHECK(priority IN ('low','medium','high','urgent')),
    due_at          TEXT NOT NULL,
    assignee_id     TEXT,
    last_notified_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_task_due_at ON task(due_at);
CREATE INDEX IF NOT EXISTS idx_task_assignee ON task(assignee_id);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
