//! Assignee lookup record.

use serde::{Deserialize, Serialize};

/// Read-only view of a task board user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Assignee {
    /// User identifier referenced by `Task::assignee_id`.
    pub id: String,
    /// Delivery address, if the user has one on file.
    pub email: Option<String>,
    /// Name used in the greeting line.
    pub display_name: Option<String>,
}

impl Assignee {
    /// Email address if present and non-blank.
    #[must_use]
    pub fn deliverable_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    /// Name to greet the user with.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("there")
    }
}
