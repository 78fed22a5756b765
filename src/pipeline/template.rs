//! Deadline reminder email rendering.

use chrono::{DateTime, Utc};

use crate::delivery::EmailMessage;
use crate::models::notification::Severity;
use crate::models::task::DueTask;

/// Body text used when a task has no description.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description provided.";

const DUE_DATE_FORMAT: &str = "%A, %B %-d, %Y at %H:%M UTC";

/// Whole hours until `due_at`, rounding half an hour up.
#[must_use]
pub fn hours_left(due_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (due_at - now).num_seconds();
    (seconds + 1800).div_euclid(3600)
}

/// Escape text for inclusion in HTML element content or attribute values.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn plural_hours(hours: i64) -> &'static str {
    if hours == 1 {
        "hour"
    } else {
        "hours"
    }
}

/// Subject line naming the task and the time left.
#[must_use]
pub fn subject(title: &str, hours_left: i64) -> String {
    format!(
        "Reminder: \"{title}\" is due in {hours_left} {}",
        plural_hours(hours_left)
    )
}

/// Render the reminder for `entry` addressed to `to`.
#[must_use]
pub fn render(
    entry: &DueTask,
    to: &str,
    hours_left: i64,
    dashboard_url: Option<&str>,
) -> EmailMessage {
    let task = &entry.task;
    let severity = Severity::from_hours_left(hours_left);
    let description = task
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DESCRIPTION_PLACEHOLDER);

    let mut html = String::with_capacity(1024);
    html.push_str(
        "<div style=\"font-family:Arial,sans-serif;max-width:600px;margin:0 auto;color:#111827\">",
    );
    html.push_str(&format!(
        "<p>Hi {},</p><p>A task assigned to you is due soon.</p>",
        escape_html(entry.assignee.greeting_name())
    ));
    html.push_str(&format!(
        "<h2 style=\"margin:16px 0 8px\">{}</h2><p style=\"color:#4b5563\">{}</p>",
        escape_html(&task.title),
        escape_html(description)
    ));
    html.push_str(&format!(
        "<table style=\"border-collapse:collapse\">\
         <tr><td style=\"padding:4px 12px 4px 0\"><strong>Due</strong></td><td>{}</td></tr>\
         <tr><td style=\"padding:4px 12px 4px 0\"><strong>Priority</strong></td><td>{}</td></tr>\
         </table>",
        task.due_at.format(DUE_DATE_FORMAT),
        task.priority.label()
    ));
    html.push_str(&format!(
        "<p style=\"margin-top:16px\"><span style=\"display:inline-block;padding:6px 12px;\
         border-radius:4px;color:#ffffff;background-color:{}\">{} {} left</span></p>",
        severity.color(),
        hours_left,
        plural_hours(hours_left)
    ));
    if let Some(base) = dashboard_url {
        html.push_str(&format!(
            "<p><a href=\"{}/tasks/{}\">View task</a></p>",
            escape_html(base),
            escape_html(&task.id)
        ));
    }
    html.push_str("</div>");

    EmailMessage {
        to: to.to_owned(),
        subject: subject(&task.title, hours_left),
        html,
    }
}
