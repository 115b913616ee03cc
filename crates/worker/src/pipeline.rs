//! The fetch interception pipeline.
//!
//! Entry point for every request the gateway sees. Non-GET requests and
//! URLs outside the origin allow-list pass through untouched; everything
//! else is classified and answered by exactly one caching strategy. Once a
//! request is accepted for interception the pipeline always terminates in a
//! response, possibly the empty offline response — failures never propagate
//! to the caller.

use std::sync::Arc;

use squall_core::store::PartitionKind;
use squall_core::{AppConfig, CacheStorage, Error, PartitionHandle, PartitionRegistry, ResponseSnapshot};
use url::Url;

use crate::classify::{ResourceClass, classify};
use crate::fetch::FetchClient;
use crate::origins::OriginPolicy;
use crate::request::FetchRequest;
use crate::strategy::StoreGate;

/// Outcome of offering a request to the pipeline.
#[derive(Debug)]
pub enum Intercept {
    /// The request is outside the caching contract; relay it untouched.
    Passthrough,
    /// The pipeline produced a response.
    Respond(ResponseSnapshot),
}

impl Intercept {
    /// Whether the request was left to the caller.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Intercept::Passthrough)
    }

    /// The response, if one was produced.
    pub fn into_snapshot(self) -> Option<ResponseSnapshot> {
        match self {
            Intercept::Passthrough => None,
            Intercept::Respond(snapshot) => Some(snapshot),
        }
    }
}

/// The per-request interception pipeline.
pub struct FetchPipeline {
    pub(crate) client: Arc<FetchClient>,
    pub(crate) storage: CacheStorage,
    pub(crate) registry: PartitionRegistry,
    origins: OriginPolicy,
    api_prefix: String,
    pub(crate) offline_url: Url,
    pub(crate) placeholder_url: Url,
}

impl FetchPipeline {
    /// Build the pipeline from configuration and shared collaborators.
    pub fn new(
        config: &AppConfig, client: Arc<FetchClient>, storage: CacheStorage, registry: PartitionRegistry,
    ) -> Result<Self, Error> {
        let origins = OriginPolicy::new(&config.origin, config.trusted_hosts.clone())?;
        let base = origins.own_origin().clone();

        let offline_url = base
            .join(&config.offline_path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.offline_path)))?;
        let placeholder_url = base
            .join(&config.placeholder_path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.placeholder_path)))?;

        Ok(Self {
            client,
            storage,
            registry,
            origins,
            api_prefix: config.api_prefix.clone(),
            offline_url,
            placeholder_url,
        })
    }

    /// The shared cache storage.
    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// The partition registry this pipeline stores into.
    pub fn registry(&self) -> &PartitionRegistry {
        &self.registry
    }

    /// Offer a request to the pipeline.
    ///
    /// Runs the request lifecycle: gate, classify, then exactly one
    /// strategy with its fallback chain.
    pub async fn handle(&self, request: &FetchRequest) -> Intercept {
        if !request.is_get() || !self.origins.allows(&request.url) {
            return Intercept::Passthrough;
        }

        let class = classify(request, &self.api_prefix);
        tracing::debug!(url = %request.url, ?class, "intercepted");

        let snapshot = match class {
            ResourceClass::Font => self.cache_first(request, class).await,
            ResourceClass::Image => self.cache_first_with_refresh(request).await,
            ResourceClass::Navigation => self.network_first(request, class, StoreGate::AnySuccess, true).await,
            ResourceClass::ScriptOrStyle => self.stale_while_revalidate(request, class).await,
            ResourceClass::Api | ResourceClass::Other => {
                self.network_first(request, class, StoreGate::ExactlyOk, false).await
            }
        };

        Intercept::Respond(snapshot)
    }

    /// The current partition for a resource class.
    pub(crate) async fn partition_for(&self, class: ResourceClass) -> PartitionHandle {
        self.storage.open(self.registry.name_for(class.partition_kind())).await
    }

    /// Look up a precached resource by URL.
    pub(crate) async fn precached(&self, url: &Url) -> Option<ResponseSnapshot> {
        let precache = self.storage.open(self.registry.name_for(PartitionKind::Precache)).await;
        precache.get(&squall_core::store::request_key(url)).await
    }
}
