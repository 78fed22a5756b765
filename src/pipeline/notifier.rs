//! Sequential per-task notifier.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::template;
use crate::delivery::MailDelivery;
use crate::models::notification::{NotificationOutcome, TaskNotificationResult};
use crate::models::task::DueTask;
use crate::persistence::TaskRepository;
use crate::AppError;

/// Notify one eligible task and report what happened.
///
/// Never fails: every per-task error is folded into the returned result
/// so the batch can continue. `last_notified_at` is stamped only after
/// the delivery service confirms the send.
pub async fn notify_one(
    repo: &dyn TaskRepository,
    mailer: &dyn MailDelivery,
    entry: &DueTask,
    now: DateTime<Utc>,
    dashboard_url: Option<&str>,
) -> TaskNotificationResult {
    let task_id = entry.task.id.clone();
    let hours_left = template::hours_left(entry.task.due_at, now);

    let Some(to) = entry.assignee.deliverable_email() else {
        let err = AppError::MissingRecipient(format!(
            "assignee {} has no email address",
            entry.assignee.id
        ));
        warn!(task_id = %task_id, %err, "skipping task");
        return TaskNotificationResult {
            task_id,
            hours_left,
            outcome: NotificationOutcome::Skipped {
                reason: err.to_string(),
            },
        };
    };

    let message = template::render(entry, to, hours_left, dashboard_url);

    let outcome = match mailer.send(&message).await {
        Ok(receipt) => match repo.mark_notified(&task_id, now).await {
            Ok(()) => {
                info!(task_id = %task_id, delivery_id = %receipt.id, hours_left, "deadline reminder sent");
                NotificationOutcome::Sent {
                    delivery_id: receipt.id,
                }
            }
            Err(err) => {
                warn!(
                    task_id = %task_id,
                    delivery_id = %receipt.id,
                    %err,
                    "reminder sent but last_notified_at was not recorded"
                );
                NotificationOutcome::Failed {
                    error: err.to_string(),
                    delivery_id: Some(receipt.id),
                }
            }
        },
        Err(err) => {
            warn!(task_id = %task_id, %err, "deadline reminder delivery failed");
            NotificationOutcome::Failed {
                error: err.to_string(),
                delivery_id: None,
            }
        }
    };

    TaskNotificationResult {
        task_id,
        hours_left,
        outcome,
    }
}
