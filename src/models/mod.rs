//! Core data models for the evidence service.
//!
//! Rows map to SQLite tables via `sqlx::FromRow` and serialize as JSON via
//! `serde` for the HTTP layer.

pub mod event;
pub mod evidence;
pub mod user;
