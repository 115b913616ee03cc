//! Core types and shared functionality for squall.
//!
//! This crate provides:
//! - The durable submission outbox with SQLite backend
//! - The in-memory cache partition store and generation registry
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod outbox;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use outbox::{OutboxDb, PendingSubmission};
pub use store::{CacheStorage, PartitionHandle, PartitionKind, PartitionRegistry, ResponseSnapshot};
