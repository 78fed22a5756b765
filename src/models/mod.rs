//! Domain model module declarations.

pub mod notification;
pub mod task;
pub mod user;
