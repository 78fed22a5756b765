//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{AppError, Result};

/// Keychain service under which credentials are stored.
pub const KEYRING_SERVICE: &str = "due-notify";

/// Outbound email delivery settings.
///
/// The API key is loaded at runtime via OS keychain or environment
/// variable, never from the TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DeliveryConfig {
    /// HTTPS endpoint accepting `POST` email submissions.
    pub endpoint: String,
    /// Sender address placed in the `from` field.
    pub from_address: String,
    /// Per-request timeout for the delivery call.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Bearer token for the delivery API (populated at runtime).
    #[serde(skip)]
    pub api_key: String,
}

/// Scan window and cadence settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleConfig {
    /// Whether `serve` runs the periodic loop.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between scheduled runs.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Forward window within which a due task is eligible.
    #[serde(default = "default_window_hours")]
    pub lookahead_hours: u32,
    /// Minimum time between two notifications for the same task.
    #[serde(default = "default_window_hours")]
    pub cooldown_hours: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_seconds: default_interval_seconds(),
            lookahead_hours: default_window_hours(),
            cooldown_hours: default_window_hours(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval_seconds() -> u64 {
    3600
}

fn default_window_hours() -> u32 {
    24
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_http_port() -> u16 {
    8787
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// `SQLite` database file holding the task and user tables.
    pub database_path: PathBuf,
    /// HTTP port for the health and manual trigger endpoints.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Base URL of the task board, used to link tasks from emails.
    #[serde(default)]
    pub dashboard_url: Option<String>,
    /// Email delivery settings.
    pub delivery: DeliveryConfig,
    /// Scan cadence and window sizes.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Shared secret required by `POST /run` (populated at runtime).
    #[serde(skip)]
    pub trigger_token: Option<String>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the delivery API key and optional trigger token from the OS
    /// keychain with env-var fallback.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no delivery API key is available.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.delivery.api_key =
            load_credential("delivery_api_key", "DUE_NOTIFY_DELIVERY_API_KEY")
                .await?
                .ok_or_else(|| {
                    AppError::Config(
                        "credential delivery_api_key not found in keychain or \
                         DUE_NOTIFY_DELIVERY_API_KEY env var"
                            .into(),
                    )
                })?;
        self.trigger_token = load_credential("trigger_token", "DUE_NOTIFY_TRIGGER_TOKEN").await?;
        Ok(())
    }

    /// Lookahead window as a signed duration.
    #[must_use]
    pub fn lookahead(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.schedule.lookahead_hours))
    }

    /// Cooldown window as a signed duration.
    #[must_use]
    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.schedule.cooldown_hours))
    }

    /// Interval between scheduled runs.
    #[must_use]
    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_seconds)
    }

    /// Timeout applied to each delivery request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery.request_timeout_seconds)
    }

    fn validate(&mut self) -> Result<()> {
        if self.schedule.interval_seconds == 0 {
            return Err(AppError::Config(
                "schedule.interval_seconds must be greater than zero".into(),
            ));
        }
        if self.schedule.lookahead_hours == 0 {
            return Err(AppError::Config(
                "schedule.lookahead_hours must be greater than zero".into(),
            ));
        }
        if self.schedule.cooldown_hours == 0 {
            return Err(AppError::Config(
                "schedule.cooldown_hours must be greater than zero".into(),
            ));
        }
        if self.delivery.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "delivery.request_timeout_seconds must be greater than zero".into(),
            ));
        }
        if self.delivery.from_address.trim().is_empty() {
            return Err(AppError::Config(
                "delivery.from_address must not be empty".into(),
            ));
        }
        let endpoint = self.delivery.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(AppError::Config(format!(
                "delivery.endpoint must be an http(s) URL: {endpoint}"
            )));
        }

        if let Some(url) = self.dashboard_url.take() {
            let trimmed = url.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                self.dashboard_url = Some(trimmed.to_owned());
            }
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
///
/// Returns `Ok(None)` when neither source provides a non-empty value.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(keyring::Error::NoEntry) => {
            debug!(key = keyring_key, "no keychain entry, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    Ok(env::var(env_key).ok().filter(|value| !value.trim().is_empty()))
}
