//! Cooldown filter. Pure; no store access.

use chrono::{DateTime, Utc};

use crate::models::task::DueTask;

/// Whether enough time has passed since the last notification.
///
/// A stamp in the future counts as inside the cooldown.
#[must_use]
pub fn is_cooled_down(
    last_notified_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown: chrono::Duration,
) -> bool {
    last_notified_at.is_none_or(|last| now - last >= cooldown)
}

/// Keep only entries outside their cooldown window.
#[must_use]
pub fn apply_cooldown(
    entries: Vec<DueTask>,
    now: DateTime<Utc>,
    cooldown: chrono::Duration,
) -> Vec<DueTask> {
    entries
        .into_iter()
        .filter(|entry| is_cooled_down(entry.task.last_notified_at, now, cooldown))
        .collect()
}
