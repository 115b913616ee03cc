//! Caching strategies.
//!
//! One strategy per resource class, each with its own fallback chain:
//!
//! - cache-first (fonts): cache hit short-circuits the network entirely
//! - cache-first with background refresh (images): hits are revalidated
//!   without blocking; total failure falls back to the precached placeholder
//! - network-first (navigations, API, generic): live response preferred,
//!   cache then offline document as fallbacks, store gated by status
//! - stale-while-revalidate (scripts/styles): cached value returned
//!   immediately while the cache refreshes concurrently
//!
//! Background refreshes are fire-and-forget: their failures are logged at
//! debug and never retried. Cache writes are best-effort and never suppress
//! a successfully fetched response.

use std::sync::Arc;

use reqwest::StatusCode;
use squall_core::{PartitionHandle, ResponseSnapshot};

use crate::classify::ResourceClass;
use crate::pipeline::FetchPipeline;
use crate::request::FetchRequest;

/// Which statuses a network-first strategy is allowed to store.
#[derive(Debug, Clone, Copy)]
pub(crate) enum StoreGate {
    /// Any 2xx.
    AnySuccess,
    /// Status 200 exactly.
    ExactlyOk,
}

impl StoreGate {
    fn permits(self, status: StatusCode) -> bool {
        match self {
            StoreGate::AnySuccess => status.is_success(),
            StoreGate::ExactlyOk => status == StatusCode::OK,
        }
    }
}

impl FetchPipeline {
    /// Cache-first: a hit short-circuits before any network activity.
    pub(crate) async fn cache_first(&self, request: &FetchRequest, class: ResourceClass) -> ResponseSnapshot {
        let partition = self.partition_for(class).await;
        let key = request.key();

        if let Some(hit) = partition.get(&key).await {
            return hit;
        }

        match self.client.get(&request.url).await {
            Ok(response) => {
                let snapshot = response.to_snapshot();
                if snapshot.is_success() {
                    partition.put(&key, snapshot.clone()).await;
                }
                snapshot
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "cache-first miss and fetch failed");
                ResponseSnapshot::offline()
            }
        }
    }

    /// Cache-first with a non-blocking revalidation on every hit.
    ///
    /// Total failure (no cache, no network) falls back to the precached
    /// placeholder resource.
    pub(crate) async fn cache_first_with_refresh(&self, request: &FetchRequest) -> ResponseSnapshot {
        let partition = self.partition_for(ResourceClass::Image).await;
        let key = request.key();

        if let Some(hit) = partition.get(&key).await {
            self.spawn_refresh(request.clone(), partition);
            return hit;
        }

        match self.client.get(&request.url).await {
            Ok(response) => {
                let snapshot = response.to_snapshot();
                if snapshot.is_success() {
                    partition.put(&key, snapshot.clone()).await;
                }
                snapshot
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "image fetch failed, using placeholder");
                match self.precached(&self.placeholder_url).await {
                    Some(placeholder) => placeholder,
                    None => ResponseSnapshot::offline(),
                }
            }
        }
    }

    /// Network-first with status-gated store.
    ///
    /// On failure: cached match for this exact request, then (for
    /// navigations) the precached offline document, then the empty offline
    /// response.
    pub(crate) async fn network_first(
        &self, request: &FetchRequest, class: ResourceClass, gate: StoreGate, offline_document: bool,
    ) -> ResponseSnapshot {
        let key = request.key();

        match self.client.get(&request.url).await {
            Ok(response) => {
                let snapshot = response.to_snapshot();
                if gate.permits(response.status) {
                    let partition = self.partition_for(class).await;
                    partition.put(&key, snapshot.clone()).await;
                }
                snapshot
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network-first fetch failed");

                if let Some(cached) = self.storage.match_any(&key).await {
                    return cached;
                }
                if offline_document && let Some(document) = self.precached(&self.offline_url).await {
                    return document;
                }
                ResponseSnapshot::offline()
            }
        }
    }

    /// Stale-while-revalidate: a cached value is returned immediately while
    /// the refresh runs concurrently; with nothing cached, the in-flight
    /// fetch is the result.
    pub(crate) async fn stale_while_revalidate(&self, request: &FetchRequest, class: ResourceClass) -> ResponseSnapshot {
        let partition = self.partition_for(class).await;
        let key = request.key();

        if let Some(hit) = partition.get(&key).await {
            self.spawn_refresh(request.clone(), partition);
            return hit;
        }

        match self.client.get(&request.url).await {
            Ok(response) => {
                let snapshot = response.to_snapshot();
                if snapshot.is_success() {
                    partition.put(&key, snapshot.clone()).await;
                }
                snapshot
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "revalidate miss and fetch failed");
                ResponseSnapshot::offline()
            }
        }
    }

    /// Detached cache refresh. Failures are swallowed after a debug log.
    fn spawn_refresh(&self, request: FetchRequest, partition: PartitionHandle) {
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            match client.get(&request.url).await {
                Ok(response) if response.status.is_success() => {
                    partition.put(&request.key(), response.to_snapshot()).await;
                    tracing::debug!(url = %request.url, "background refresh stored");
                }
                Ok(response) => {
                    tracing::debug!(url = %request.url, status = response.status.as_u16(), "background refresh skipped");
                }
                Err(e) => {
                    tracing::debug!(url = %request.url, error = %e, "background refresh failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchClient, FetchConfig};
    use crate::request::Destination;
    use bytes::Bytes;
    use squall_core::{AppConfig, CacheStorage, PartitionRegistry};
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn pipeline_for(origin: &str) -> FetchPipeline {
        let config = AppConfig { origin: origin.into(), ..Default::default() };
        let client = Arc::new(
            FetchClient::new(FetchConfig { timeout: Duration::from_millis(800), ..Default::default() }).unwrap(),
        );
        FetchPipeline::new(&config, client, CacheStorage::new(), PartitionRegistry::new(1)).unwrap()
    }

    fn snapshot(body: &'static [u8]) -> ResponseSnapshot {
        ResponseSnapshot::new(200, vec![], Bytes::from_static(body))
    }

    #[test]
    fn test_store_gate() {
        assert!(StoreGate::AnySuccess.permits(StatusCode::OK));
        assert!(StoreGate::AnySuccess.permits(StatusCode::NO_CONTENT));
        assert!(!StoreGate::AnySuccess.permits(StatusCode::NOT_FOUND));

        assert!(StoreGate::ExactlyOk.permits(StatusCode::OK));
        assert!(!StoreGate::ExactlyOk.permits(StatusCode::NO_CONTENT));
        assert!(!StoreGate::ExactlyOk.permits(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let server = MockServer::start().await;
        // Any request reaching the server fails the expectation.
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let origin = server.uri();
        let pipeline = pipeline_for(&origin).await;
        let request =
            FetchRequest::get(Url::parse(&format!("{origin}/fonts/inter.woff2")).unwrap()).with_destination(Destination::Font);

        let partition = pipeline.partition_for(ResourceClass::Font).await;
        partition.put(&request.key(), snapshot(b"font-bytes")).await;

        let hit = pipeline.cache_first(&request, ResourceClass::Font).await;
        assert_eq!(hit.body, Bytes::from_static(b"font-bytes"));
        // server verifies expect(0) on drop
    }

    #[tokio::test]
    async fn test_cache_first_miss_fetches_and_stores() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fonts/inter.woff2"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"woff2".to_vec()))
            .mount(&server)
            .await;

        let origin = server.uri();
        let pipeline = pipeline_for(&origin).await;
        let request = FetchRequest::get(Url::parse(&format!("{origin}/fonts/inter.woff2")).unwrap());

        let fetched = pipeline.cache_first(&request, ResourceClass::Font).await;
        assert_eq!(fetched.body, Bytes::from_static(b"woff2"));

        let partition = pipeline.partition_for(ResourceClass::Font).await;
        assert!(partition.get(&request.key()).await.is_some());
    }

    #[tokio::test]
    async fn test_cache_first_total_failure_is_empty_offline() {
        let server = MockServer::start().await;
        let origin = server.uri();
        let pipeline = pipeline_for(&origin).await;
        drop(server);

        let request = FetchRequest::get(Url::parse(&format!("{origin}/fonts/inter.woff2")).unwrap());
        let result = pipeline.cache_first(&request, ResourceClass::Font).await;
        assert_eq!(result.status, 503);
        assert!(result.body.is_empty());
    }

    #[tokio::test]
    async fn test_swr_returns_cached_while_refresh_in_flight() {
        let server = MockServer::start().await;
        // Refresh is slow; the cached value must come back immediately anyway.
        Mock::given(method("GET"))
            .and(path("/scripts/app.js"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"v2".to_vec())
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let origin = server.uri();
        let pipeline = pipeline_for(&origin).await;
        let request = FetchRequest::get(Url::parse(&format!("{origin}/scripts/app.js")).unwrap());

        let partition = pipeline.partition_for(ResourceClass::ScriptOrStyle).await;
        partition.put(&request.key(), snapshot(b"v1")).await;

        let start = std::time::Instant::now();
        let result = pipeline.stale_while_revalidate(&request, ResourceClass::ScriptOrStyle).await;
        assert_eq!(result.body, Bytes::from_static(b"v1"));
        assert!(start.elapsed() < Duration::from_millis(250));

        // The concurrent refresh eventually lands.
        for _ in 0..40 {
            if partition.get(&request.key()).await.unwrap().body == Bytes::from_static(b"v2") {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("background refresh never updated the partition");
    }

    #[tokio::test]
    async fn test_swr_miss_uses_in_flight_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/styles/main.css"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"body{}".to_vec()))
            .mount(&server)
            .await;

        let origin = server.uri();
        let pipeline = pipeline_for(&origin).await;
        let request = FetchRequest::get(Url::parse(&format!("{origin}/styles/main.css")).unwrap());

        let result = pipeline.stale_while_revalidate(&request, ResourceClass::ScriptOrStyle).await;
        assert_eq!(result.body, Bytes::from_static(b"body{}"));

        let partition = pipeline.partition_for(ResourceClass::ScriptOrStyle).await;
        assert!(partition.get(&request.key()).await.is_some());
    }

    #[tokio::test]
    async fn test_image_hit_triggers_background_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/hero.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh".to_vec()))
            .mount(&server)
            .await;

        let origin = server.uri();
        let pipeline = pipeline_for(&origin).await;
        let request = FetchRequest::get(Url::parse(&format!("{origin}/img/hero.png")).unwrap());

        let partition = pipeline.partition_for(ResourceClass::Image).await;
        partition.put(&request.key(), snapshot(b"stale")).await;

        let result = pipeline.cache_first_with_refresh(&request).await;
        assert_eq!(result.body, Bytes::from_static(b"stale"));

        for _ in 0..40 {
            if partition.get(&request.key()).await.unwrap().body == Bytes::from_static(b"fresh") {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("background refresh never updated the partition");
    }

    #[tokio::test]
    async fn test_network_first_does_not_store_non_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let origin = server.uri();
        let pipeline = pipeline_for(&origin).await;
        let request = FetchRequest::get(Url::parse(&format!("{origin}/flaky")).unwrap());

        let result = pipeline
            .network_first(&request, ResourceClass::Other, StoreGate::ExactlyOk, false)
            .await;
        assert_eq!(result.status, 502);

        let partition = pipeline.partition_for(ResourceClass::Other).await;
        assert!(partition.get(&request.key()).await.is_none());
    }
}
