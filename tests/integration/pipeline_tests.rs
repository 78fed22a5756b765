//! Pipeline behaviour over fake collaborators.
//!
//! Covers the eligibility scenarios end to end: scan filtering, cooldown
//! exclusion, per-task outcomes, and the summary counters.

use std::sync::Arc;

use chrono::Duration;

use due_notify::models::notification::NotificationOutcome;
use due_notify::models::task::TaskStatus;
use due_notify::AppError;

use super::test_helpers::{assignee, due_entry, fixed_now, pipeline, FakeMailer, FakeRepo};

#[tokio::test]
async fn due_in_five_hours_is_sent_with_amber_badge() {
    let now = fixed_now();
    let user = assignee("u1");
    let entry = due_entry("Write release notes", &user, now, 5);
    let task_id = entry.task.id.clone();

    let repo = Arc::new(FakeRepo::with_rows(vec![entry]));
    let mailer = Arc::new(FakeMailer::default());
    let summary = pipeline(&repo, &mailer).run(now).await.expect("run");

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.eligible, 1);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.results[0].hours_left, 5);
    assert_eq!(
        summary.results[0].outcome,
        NotificationOutcome::Sent {
            delivery_id: "msg_1".into()
        }
    );

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "u1@example.com");
    assert!(sent[0].subject.contains("Write release notes"));
    assert!(sent[0].subject.contains('5'));
    assert!(sent[0].html.contains("#f59e0b"), "amber badge expected");

    let stamped = repo.task(&task_id).expect("task present");
    assert_eq!(stamped.last_notified_at, Some(now));
}

#[tokio::test]
async fn recently_notified_task_never_reaches_notifier() {
    let now = fixed_now();
    let user = assignee("u1");
    let mut entry = due_entry("Standup prep", &user, now, 2);
    entry.task.last_notified_at = Some(now - Duration::hours(1));

    let repo = Arc::new(FakeRepo::with_rows(vec![entry]));
    let mailer = Arc::new(FakeMailer::default());
    let summary = pipeline(&repo, &mailer).run(now).await.expect("run");

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.eligible, 0);
    assert!(summary.results.is_empty());
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn unassigned_task_is_excluded_by_scanner() {
    let now = fixed_now();
    let user = assignee("u1");
    let mut entry = due_entry("Orphan", &user, now, 3);
    entry.task.assignee_id = None;

    let repo = Arc::new(FakeRepo::with_rows(vec![entry]));
    let mailer = Arc::new(FakeMailer::default());
    let summary = pipeline(&repo, &mailer).run(now).await.expect("run");

    assert_eq!(summary.scanned, 0);
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn done_and_out_of_window_tasks_are_excluded() {
    let now = fixed_now();
    let user = assignee("u1");
    let mut done = due_entry("Finished", &user, now, 4);
    done.task.status = TaskStatus::Done;
    let overdue = due_entry("Overdue", &user, now, -1);
    let far = due_entry("Next week", &user, now, 24 * 7);
    let edge = due_entry("Exactly a day out", &user, now, 24);

    let repo = Arc::new(FakeRepo::with_rows(vec![done, overdue, far, edge]));
    let mailer = Arc::new(FakeMailer::default());
    let summary = pipeline(&repo, &mailer).run(now).await.expect("run");

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.sent, 1);
    assert!(mailer.sent()[0].subject.contains("Exactly a day out"));
}

#[tokio::test]
async fn scanner_queries_lookahead_window_from_now() {
    let now = fixed_now();
    let repo = Arc::new(FakeRepo::default());
    let mailer = Arc::new(FakeMailer::default());
    pipeline(&repo, &mailer).run(now).await.expect("run");

    let queries = repo.queries.lock().expect("lock").clone();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].window_start, now);
    assert_eq!(queries[0].window_end, now + Duration::hours(24));
}

#[tokio::test]
async fn assignee_without_email_is_skipped_without_mutation() {
    let now = fixed_now();
    let mut user = assignee("u2");
    user.email = None;
    let entry = due_entry("No inbox", &user, now, 6);
    let task_id = entry.task.id.clone();

    let repo = Arc::new(FakeRepo::with_rows(vec![entry]));
    let mailer = Arc::new(FakeMailer::default());
    let summary = pipeline(&repo, &mailer).run(now).await.expect("run");

    assert_eq!(summary.skipped, 1);
    assert!(matches!(
        summary.results[0].outcome,
        NotificationOutcome::Skipped { .. }
    ));
    assert!(mailer.sent().is_empty());
    assert_eq!(repo.task(&task_id).expect("task").last_notified_at, None);
}

#[tokio::test]
async fn failed_send_leaves_task_eligible_and_batch_continues() {
    let now = fixed_now();
    let bouncing = assignee("bounce");
    let ok = assignee("ok");
    let first = due_entry("Will bounce", &bouncing, now, 1);
    let second = due_entry("Will send", &ok, now, 2);
    let bounced_id = first.task.id.clone();

    let repo = Arc::new(FakeRepo::with_rows(vec![first, second]));
    let mailer = Arc::new(FakeMailer::rejecting("bounce@example.com"));
    let pipeline = pipeline(&repo, &mailer);

    let summary = pipeline.run(now).await.expect("run");
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.results[0].task_id, bounced_id);
    assert!(matches!(
        &summary.results[0].outcome,
        NotificationOutcome::Failed { delivery_id: None, error } if error.starts_with("delivery:")
    ));
    assert_eq!(repo.task(&bounced_id).expect("task").last_notified_at, None);

    // Ten minutes later only the bounced task is eligible again.
    let later = now + Duration::minutes(10);
    let summary = pipeline.run(later).await.expect("second run");
    assert_eq!(summary.eligible, 1);
    assert_eq!(summary.results[0].task_id, bounced_id);
}

#[tokio::test]
async fn stamp_failure_after_send_is_reported_as_failed_with_delivery_id() {
    let now = fixed_now();
    let user = assignee("u1");
    let entry = due_entry("Sticky", &user, now, 8);
    let task_id = entry.task.id.clone();

    let repo = Arc::new(FakeRepo::with_rows(vec![entry]).fail_mark_for(&task_id));
    let mailer = Arc::new(FakeMailer::default());
    let summary = pipeline(&repo, &mailer).run(now).await.expect("run");

    assert_eq!(summary.failed, 1);
    assert_eq!(
        summary.results[0].outcome,
        NotificationOutcome::Failed {
            error: "data access: update rejected".into(),
            delivery_id: Some("msg_1".into()),
        }
    );
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn sent_task_is_excluded_from_the_next_run() {
    let now = fixed_now();
    let user = assignee("u1");
    let entry = due_entry("Quarterly report", &user, now, 20);

    let repo = Arc::new(FakeRepo::with_rows(vec![entry]));
    let mailer = Arc::new(FakeMailer::default());
    let pipeline = pipeline(&repo, &mailer);

    assert_eq!(pipeline.run(now).await.expect("run").sent, 1);

    let an_hour_later = pipeline
        .run(now + Duration::hours(1))
        .await
        .expect("run");
    assert_eq!(an_hour_later.scanned, 1);
    assert_eq!(an_hour_later.eligible, 0);
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn stale_notification_stamp_is_eligible_again() {
    let now = fixed_now();
    let user = assignee("u1");
    let mut entry = due_entry("Rescheduled", &user, now, 2);
    entry.task.last_notified_at = Some(now - Duration::hours(25));

    let repo = Arc::new(FakeRepo::with_rows(vec![entry]));
    let mailer = Arc::new(FakeMailer::default());
    let summary = pipeline(&repo, &mailer).run(now).await.expect("run");

    assert_eq!(summary.eligible, 1);
    assert_eq!(summary.sent, 1);
    assert!(mailer.sent()[0].html.contains("#dc2626"), "red badge expected");
}

#[tokio::test]
async fn scan_failure_aborts_run() {
    let repo = Arc::new(FakeRepo::failing_scan());
    let mailer = Arc::new(FakeMailer::default());
    let err = pipeline(&repo, &mailer)
        .run(fixed_now())
        .await
        .expect_err("scan failure is fatal");

    assert!(matches!(err, AppError::DataAccess(_)));
    assert!(mailer.sent().is_empty());
}
