//! In-process run coordination and the periodic schedule loop.
//!
//! The scheduled loop and the HTTP trigger share one [`Runner`], whose
//! gate keeps runs inside this process from overlapping. Separate
//! processes are not coordinated.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::models::notification::RunSummary;
use crate::pipeline::NotificationPipeline;
use crate::Result;

/// Serializes pipeline runs within one process.
pub struct Runner {
    pipeline: NotificationPipeline,
    gate: Mutex<()>,
}

impl Runner {
    /// Wrap a pipeline.
    #[must_use]
    pub fn new(pipeline: NotificationPipeline) -> Self {
        Self {
            pipeline,
            gate: Mutex::new(()),
        }
    }

    /// Run the pipeline at `now`, waiting for any in-flight run first.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline's fatal scan error.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let _guard = self.gate.lock().await;
        self.pipeline.run(now).await
    }

    /// Run the pipeline at the current wall-clock time.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline's fatal scan error.
    pub async fn run_now(&self) -> Result<RunSummary> {
        let _guard = self.gate.lock().await;
        self.pipeline.run(Utc::now()).await
    }
}

/// Spawn the periodic notification task.
///
/// The first tick fires immediately. A run that overlaps the next tick
/// delays it rather than bursting.
#[must_use]
pub fn spawn_schedule_task(
    runner: Arc<Runner>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("schedule task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(err) = runner.run_now().await {
                        error!(%err, "scheduled notification run failed");
                    }
                }
            }
        }
    })
}
