//! Offline worker for squall.
//!
//! This crate provides the fetch interception pipeline, the request
//! classifier, the caching strategies, the background sync agent, and the
//! lifecycle root object shared by the gateway daemon and tests.

pub mod classify;
pub mod fetch;
pub mod lifecycle;
pub mod origins;
pub mod pipeline;
pub mod request;
pub mod strategy;
pub mod sync;

pub use classify::{ResourceClass, classify};
pub use fetch::{FetchClient, FetchConfig, FetchedResponse};
pub use lifecycle::{OfflineWorker, PushNotice};
pub use origins::OriginPolicy;
pub use pipeline::{FetchPipeline, Intercept};
pub use request::{Destination, FetchRequest, RequestMode};
pub use sync::{DrainReport, OUTBOX_SYNC_TAG, PERIODIC_SYNC_TAG, SyncAgent};
