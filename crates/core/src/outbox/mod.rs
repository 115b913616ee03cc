//! SQLite-backed outbox for pending form submissions.
//!
//! This module provides the durable queue that survives process restarts,
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Idempotent enqueue (same id overwrites)
//! - Snapshot listing with unspecified order
//! - Removal by id, a no-op when the id is absent
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod migrations;
pub mod records;

pub use crate::Error;

pub use connection::OutboxDb;
pub use records::PendingSubmission;
