#![forbid(unsafe_code)]

//! `due-notify` — deadline notification job binary.
//!
//! `serve` runs the periodic schedule plus the HTTP trigger surface until
//! a shutdown signal arrives. `run-once` performs a single pass and prints
//! the run summary as JSON.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use due_notify::config::GlobalConfig;
use due_notify::delivery::http::HttpMailer;
use due_notify::persistence::db;
use due_notify::persistence::task_repo::SqliteTaskRepo;
use due_notify::pipeline::{NotificationPipeline, PipelineSettings};
use due_notify::runner::{self, Runner};
use due_notify::server::{self, HttpState};
use due_notify::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "due-notify", about = "Deadline notification job", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the schedule loop and HTTP trigger until shutdown (default).
    Serve,
    /// Run one notification pass and print the summary as JSON.
    RunOnce {
        /// Evaluate the run at this RFC 3339 instant instead of now.
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,
    },
}

fn parse_instant(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| format!("invalid RFC 3339 timestamp: {err}"))
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("due-notify bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    info!("configuration loaded");

    // ── Initialize database ─────────────────────────────
    let database = Arc::new(db::connect(&config.database_path).await?);
    info!(path = %config.database_path.display(), "database connected");

    // ── Assemble pipeline ───────────────────────────────
    let repo = Arc::new(SqliteTaskRepo::new(database));
    let mailer = Arc::new(HttpMailer::from_config(&config)?);
    let pipeline = NotificationPipeline::new(repo, mailer, PipelineSettings::from_config(&config));
    let runner = Arc::new(Runner::new(pipeline));

    match args.command.unwrap_or(Command::Serve) {
        Command::RunOnce { now } => {
            let summary = runner.run_at(now.unwrap_or_else(Utc::now)).await?;
            let rendered = serde_json::to_string_pretty(&summary)
                .map_err(|err| AppError::Io(format!("failed to encode summary: {err}")))?;
            println!("{rendered}");
            Ok(())
        }
        Command::Serve => serve(&config, runner).await,
    }
}

async fn serve(config: &GlobalConfig, runner: Arc<Runner>) -> Result<()> {
    let ct = CancellationToken::new();

    // ── Start schedule loop ─────────────────────────────
    let schedule_handle = if config.schedule.enabled {
        info!(
            interval_seconds = config.schedule.interval_seconds,
            "schedule task started"
        );
        Some(runner::spawn_schedule_task(
            Arc::clone(&runner),
            config.run_interval(),
            ct.clone(),
        ))
    } else {
        info!("schedule disabled; runs happen only via POST /run");
        None
    };

    // ── Start HTTP trigger surface ──────────────────────
    let state = HttpState {
        runner,
        trigger_token: config.trigger_token.clone(),
    };
    let bind = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let http_ct = ct.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(err) = server::serve(state, bind, http_ct).await {
            error!(%err, "http server failed");
        }
    });

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = http_handle.await;
    if let Some(handle) = schedule_handle {
        let _ = handle.await;
    }
    info!("due-notify shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
