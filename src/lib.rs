#![forbid(unsafe_code)]

//! Deadline notifications for a task board.
//!
//! Emails the assignee of every unfinished task that is about to fall due,
//! at most once per cooldown window, and stamps `last_notified_at` after
//! each confirmed send.

pub mod config;
pub mod delivery;
pub mod errors;
pub mod models;
pub mod persistence;
pub mod pipeline;
pub mod runner;
pub mod server;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
