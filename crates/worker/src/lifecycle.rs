//! Worker lifecycle.
//!
//! `OfflineWorker` is the root object the gateway owns: it wires the fetch
//! client, cache storage, registry, pipeline, and sync agent together and
//! exposes the lifecycle operations — install (precache), activate (purge
//! stale generations), fetch interception, and the sync triggers. Push
//! payloads are parsed and handed back to the embedder; their presentation
//! is not this crate's concern.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use squall_core::store::{PartitionKind, request_key};
use squall_core::{AppConfig, CacheStorage, Error, OutboxDb, PartitionRegistry};
use url::Url;

use crate::fetch::{FetchClient, FetchConfig};
use crate::pipeline::{FetchPipeline, Intercept};
use crate::request::FetchRequest;
use crate::sync::{DrainReport, OUTBOX_SYNC_TAG, PERIODIC_SYNC_TAG, SyncAgent};

/// A parsed push payload, handed to the embedder for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushNotice {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Where a notification click navigates to.
    #[serde(default = "default_click_url")]
    pub url: String,
}

fn default_title() -> String {
    "Notification".into()
}

fn default_click_url() -> String {
    "/".into()
}

impl Default for PushNotice {
    fn default() -> Self {
        Self { title: default_title(), body: String::new(), url: default_click_url() }
    }
}

impl PushNotice {
    /// Parse a push payload.
    ///
    /// JSON payloads fill the fields they carry; non-JSON payloads become
    /// the notification body; an absent payload yields the defaults.
    pub fn from_payload(payload: Option<&str>) -> Self {
        match payload {
            Some(raw) => serde_json::from_str(raw)
                .unwrap_or_else(|_| Self { body: raw.to_string(), ..Self::default() }),
            None => Self::default(),
        }
    }
}

/// The worker root: owns the pipeline and sync agent, drives the lifecycle.
pub struct OfflineWorker {
    client: Arc<FetchClient>,
    storage: CacheStorage,
    registry: PartitionRegistry,
    pipeline: FetchPipeline,
    sync: SyncAgent,
    precache_urls: Vec<Url>,
}

impl OfflineWorker {
    /// Wire up a worker from configuration and an opened outbox.
    pub fn new(config: &AppConfig, outbox: OutboxDb) -> Result<Self, Error> {
        let client = Arc::new(FetchClient::new(FetchConfig {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        })?);

        let storage = CacheStorage::new();
        let registry = PartitionRegistry::new(config.cache_version);

        let pipeline = FetchPipeline::new(config, Arc::clone(&client), storage.clone(), registry.clone())?;

        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        let endpoint = origin
            .join(&config.submit_path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.submit_path)))?;

        let sync = SyncAgent::new(outbox, Arc::clone(&client), endpoint, storage.clone(), registry.clone());

        let precache_urls = config
            .precache_manifest
            .iter()
            .map(|path| {
                origin
                    .join(path)
                    .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { client, storage, registry, pipeline, sync, precache_urls })
    }

    /// The shared cache storage.
    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// The partition registry for the current generation.
    pub fn registry(&self) -> &PartitionRegistry {
        &self.registry
    }

    /// The sync agent.
    pub fn sync_agent(&self) -> &SyncAgent {
        &self.sync
    }

    /// Populate the precache partition from the manifest.
    ///
    /// Every entry must fetch with a 2xx status; a half-populated precache
    /// generation would make the offline fallbacks unreliable, so the first
    /// failure aborts the install. Returns the number of entries stored.
    pub async fn install(&self) -> Result<usize, Error> {
        let precache = self.storage.open(self.registry.name_for(PartitionKind::Precache)).await;

        for url in &self.precache_urls {
            let response = self
                .client
                .get(url)
                .await
                .map_err(|e| Error::PrecacheFailed(format!("{url}: {e}")))?;

            if !response.status.is_success() {
                return Err(Error::PrecacheFailed(format!("{url}: status {}", response.status.as_u16())));
            }

            precache.put(&request_key(url), response.to_snapshot()).await;
        }

        tracing::info!(
            count = self.precache_urls.len(),
            partition = self.registry.name_for(PartitionKind::Precache),
            "install complete"
        );
        Ok(self.precache_urls.len())
    }

    /// Purge partitions from prior generations.
    ///
    /// Returns the names of the purged partitions.
    pub async fn activate(&self) -> Vec<String> {
        let purged = self.storage.purge_unlisted(&self.registry).await;
        tracing::info!(
            generation = self.registry.generation(),
            purged = purged.len(),
            "activation purge complete"
        );
        purged
    }

    /// Offer a request to the interception pipeline.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Intercept {
        self.pipeline.handle(request).await
    }

    /// One-shot sync trigger. Unknown tags are ignored.
    pub async fn handle_sync(&self, tag: &str) -> Result<Option<DrainReport>, Error> {
        if tag != OUTBOX_SYNC_TAG {
            tracing::debug!(tag, "ignoring unknown sync tag");
            return Ok(None);
        }
        self.sync.drain().await.map(Some)
    }

    /// Periodic sync trigger: drains the outbox and sweeps stale
    /// partitions. Unknown tags are ignored.
    pub async fn handle_periodic_sync(&self, tag: &str) -> Result<Option<DrainReport>, Error> {
        if tag != PERIODIC_SYNC_TAG {
            tracing::debug!(tag, "ignoring unknown periodic sync tag");
            return Ok(None);
        }
        self.sync.sweep_partitions().await;
        self.sync.drain().await.map(Some)
    }

    /// Parse a push payload for the embedder.
    pub fn handle_push(&self, payload: Option<&str>) -> PushNotice {
        PushNotice::from_payload(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;
    use squall_core::PendingSubmission;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn worker_for(server: &MockServer, manifest: Vec<String>) -> OfflineWorker {
        let config = AppConfig {
            origin: server.uri(),
            precache_manifest: manifest,
            timeout_ms: 800,
            ..Default::default()
        };
        let outbox = OutboxDb::open_in_memory().await.unwrap();
        OfflineWorker::new(&config, outbox).unwrap()
    }

    fn mount_page(path_str: &'static str, body: &'static str) -> Mock {
        Mock::given(method("GET"))
            .and(path(path_str))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
    }

    #[tokio::test]
    async fn test_install_populates_precache() {
        let server = MockServer::start().await;
        mount_page("/", "<html>home</html>").mount(&server).await;
        mount_page("/offline.html", "<html>offline</html>").mount(&server).await;

        let worker = worker_for(&server, vec!["/".into(), "/offline.html".into()]).await;
        let count = worker.install().await.unwrap();
        assert_eq!(count, 2);

        let precache = worker
            .storage()
            .open(worker.registry().name_for(PartitionKind::Precache))
            .await;
        assert_eq!(precache.len().await, 2);
    }

    #[tokio::test]
    async fn test_install_fails_on_missing_manifest_entry() {
        let server = MockServer::start().await;
        mount_page("/", "<html>home</html>").mount(&server).await;
        // /offline.html is not mounted and 404s.

        let worker = worker_for(&server, vec!["/".into(), "/offline.html".into()]).await;
        let result = worker.install().await;
        assert!(matches!(result, Err(Error::PrecacheFailed(_))));
    }

    #[tokio::test]
    async fn test_activate_purges_stale_generations() {
        let server = MockServer::start().await;
        let worker = worker_for(&server, vec![]).await;

        worker.storage().open("squall-runtime-v0").await;
        worker.storage().open(worker.registry().name_for(PartitionKind::Runtime)).await;

        let purged = worker.activate().await;
        assert_eq!(purged, vec!["squall-runtime-v0".to_string()]);

        let names = worker.storage().partition_names().await;
        assert!(names.iter().all(|n| worker.registry().contains(n)));
    }

    #[tokio::test]
    async fn test_offline_navigation_served_after_install() {
        let server = MockServer::start().await;
        mount_page("/offline.html", "<html>offline</html>").mount(&server).await;

        let worker = worker_for(&server, vec!["/offline.html".into()]).await;
        worker.install().await.unwrap();
        let origin = server.uri();
        drop(server);

        let request = FetchRequest::get(Url::parse(&format!("{origin}/contact")).unwrap())
            .with_mode(crate::request::RequestMode::Navigate);
        let snapshot = worker.handle_fetch(&request).await.into_snapshot().unwrap();
        assert_eq!(snapshot.body, Bytes::from_static(b"<html>offline</html>"));
    }

    #[tokio::test]
    async fn test_sync_tag_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contact"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let worker = worker_for(&server, vec![]).await;
        worker
            .sync_agent()
            .outbox()
            .enqueue(&PendingSubmission::new("s1", json!({"n": 1})))
            .await
            .unwrap();

        // Unknown tag does nothing.
        assert_eq!(worker.handle_sync("unrelated").await.unwrap(), None);

        let report = worker.handle_sync(OUTBOX_SYNC_TAG).await.unwrap().unwrap();
        assert_eq!(report.delivered, 1);
    }

    #[tokio::test]
    async fn test_periodic_sync_sweeps_and_drains() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let worker = worker_for(&server, vec![]).await;
        worker.storage().open("squall-images-v0").await;

        assert_eq!(worker.handle_periodic_sync("unrelated").await.unwrap(), None);
        assert!(worker.storage().partition_names().await.contains(&"squall-images-v0".to_string()));

        let report = worker.handle_periodic_sync(PERIODIC_SYNC_TAG).await.unwrap().unwrap();
        assert_eq!(report, DrainReport::default());
        assert!(!worker.storage().partition_names().await.contains(&"squall-images-v0".to_string()));
    }

    #[test]
    fn test_push_payload_json() {
        let notice = PushNotice::from_payload(Some(r#"{"title":"Hi","body":"New post","url":"/blog"}"#));
        assert_eq!(notice, PushNotice { title: "Hi".into(), body: "New post".into(), url: "/blog".into() });
    }

    #[test]
    fn test_push_payload_partial_json_gets_defaults() {
        let notice = PushNotice::from_payload(Some(r#"{"body":"just text"}"#));
        assert_eq!(notice.title, "Notification");
        assert_eq!(notice.url, "/");
        assert_eq!(notice.body, "just text");
    }

    #[test]
    fn test_push_payload_plain_text_becomes_body() {
        let notice = PushNotice::from_payload(Some("plain text"));
        assert_eq!(notice.body, "plain text");
        assert_eq!(notice.title, "Notification");
    }

    #[test]
    fn test_push_payload_absent() {
        let notice = PushNotice::from_payload(None);
        assert_eq!(notice, PushNotice::default());
    }
}
