//! Deadline notification pipeline.
//!
//! One run is strictly sequential: [`scanner::scan`] fetches unfinished
//! assigned tasks due inside the lookahead window,
//! [`cooldown::apply_cooldown`] drops tasks notified too recently, and
//! [`notifier::notify_one`] renders, sends, and stamps each remaining task
//! in turn. The [`RunSummary`] returned by [`NotificationPipeline::run`] is
//! the only report.
//!
//! Runs hold no lock. Two overlapping runs from separate processes may both
//! see a stale `last_notified_at` and notify the same task twice.

pub mod cooldown;
pub mod notifier;
pub mod scanner;
pub mod template;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, info_span, Instrument};

use crate::config::GlobalConfig;
use crate::delivery::MailDelivery;
use crate::models::notification::RunSummary;
use crate::persistence::TaskRepository;
use crate::Result;

/// Window sizes and rendering options for a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Forward window within which a due task is eligible.
    pub lookahead: chrono::Duration,
    /// Minimum time between two notifications for one task.
    pub cooldown: chrono::Duration,
    /// Task board base URL for "View task" links.
    pub dashboard_url: Option<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            lookahead: chrono::Duration::hours(24),
            cooldown: chrono::Duration::hours(24),
            dashboard_url: None,
        }
    }
}

impl PipelineSettings {
    /// Derive settings from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            lookahead: config.lookahead(),
            cooldown: config.cooldown(),
            dashboard_url: config.dashboard_url.clone(),
        }
    }
}

/// Scan, filter, and notify with injected collaborators.
#[derive(Clone)]
pub struct NotificationPipeline {
    repo: Arc<dyn TaskRepository>,
    mailer: Arc<dyn MailDelivery>,
    settings: PipelineSettings,
}

impl NotificationPipeline {
    /// Assemble a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        repo: Arc<dyn TaskRepository>,
        mailer: Arc<dyn MailDelivery>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            repo,
            mailer,
            settings,
        }
    }

    /// Execute one run evaluated at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DataAccess` if the scan fails. Per-task failures
    /// never abort the run; they are recorded in the summary.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let span = info_span!("notification_run", run_at = %now);
        self.run_inner(now).instrument(span).await
    }

    async fn run_inner(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let scanned = scanner::scan(self.repo.as_ref(), now, self.settings.lookahead)
            .await
            .inspect_err(|err| error!(%err, "due task scan failed; aborting run"))?;
        let scanned_count = scanned.len();

        let eligible = cooldown::apply_cooldown(scanned, now, self.settings.cooldown);

        let mut summary = RunSummary::new(now, scanned_count, eligible.len());
        for entry in &eligible {
            let result = notifier::notify_one(
                self.repo.as_ref(),
                self.mailer.as_ref(),
                entry,
                now,
                self.settings.dashboard_url.as_deref(),
            )
            .await;
            summary.record(result);
        }

        info!(
            run_id = %summary.run_id,
            scanned = summary.scanned,
            eligible = summary.eligible,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            "notification run complete"
        );
        Ok(summary)
    }
}
