//! Cached facade over the catalog endpoints

use std::sync::Arc;

use musea_cache::{CacheEvent, QueryCache, QueryKey, Tag};
use musea_catalog::{Artifact, FilterRequest, TargetFile};
use tokio::sync::broadcast;

use crate::client::{ApiClient, CatalogApi};
use crate::error::SharedApiError;

/// Invalidation tags the store files entries under.
pub mod tags {
    pub const ARTIFACT: &str = "Artifact";
    pub const TARGET_BUNDLE: &str = "TargetBundle";
}

mod keys {
    pub const ARTIFACT_LIST: &str = "artifact-list";
    pub const TARGET_FILES: &str = "target-files";
}

/// What screens talk to: every read goes through the query cache, every
/// entry is tagged, and scan sessions can invalidate or reset wholesale.
///
/// Generic over [`CatalogApi`] so it can be driven by an in-memory fake in
/// tests; production wires in [`ApiClient`].
pub struct CatalogStore<A = ApiClient> {
    api: Arc<A>,
    lists: QueryCache<Vec<Artifact>, SharedApiError>,
    singles: QueryCache<Artifact, SharedApiError>,
    targets: QueryCache<Vec<TargetFile>, SharedApiError>,
}

impl<A> Clone for CatalogStore<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            lists: self.lists.clone(),
            singles: self.singles.clone(),
            targets: self.targets.clone(),
        }
    }
}

impl<A: CatalogApi> CatalogStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api: Arc::new(api),
            lists: QueryCache::new(),
            singles: QueryCache::new(),
            targets: QueryCache::new(),
        }
    }

    /// The full artifact list, cached under the `Artifact` tag.
    pub async fn artifacts(&self) -> Result<Vec<Artifact>, SharedApiError> {
        let api = Arc::clone(&self.api);
        self.lists
            .query(
                QueryKey::for_endpoint(keys::ARTIFACT_LIST),
                &[Tag::new(tags::ARTIFACT)],
                async move { api.list_artifacts().await.map_err(SharedApiError::from) },
            )
            .await
    }

    /// One artifact by identifier, cached per id under the `Artifact` tag.
    pub async fn artifact_by_id(&self, id: &str) -> Result<Artifact, SharedApiError> {
        let api = Arc::clone(&self.api);
        let id_owned = id.to_string();
        self.singles
            .query(
                QueryKey::for_id(id),
                &[Tag::new(tags::ARTIFACT)],
                async move {
                    api.artifact_by_id(&id_owned)
                        .await
                        .map_err(SharedApiError::from)
                },
            )
            .await
    }

    /// Filtered artifact list. Identifier lookups collapse to a stable
    /// `id-<value>` key, so a rescan of the same code shares one entry no
    /// matter how the request was shaped.
    pub async fn filter(&self, request: &FilterRequest) -> Result<Vec<Artifact>, SharedApiError> {
        let api = Arc::clone(&self.api);
        let request_owned = request.clone();
        self.lists
            .query(
                QueryKey::for_filter(request),
                &[Tag::new(tags::ARTIFACT)],
                async move {
                    api.filter_artifacts(&request_owned)
                        .await
                        .map_err(SharedApiError::from)
                },
            )
            .await
    }

    /// AR target bundles, cached under the `TargetBundle` tag.
    pub async fn target_files(&self) -> Result<Vec<TargetFile>, SharedApiError> {
        let api = Arc::clone(&self.api);
        self.targets
            .query(
                QueryKey::for_endpoint(keys::TARGET_FILES),
                &[Tag::new(tags::TARGET_BUNDLE)],
                async move { api.list_target_files().await.map_err(SharedApiError::from) },
            )
            .await
    }

    /// Mark everything tagged `Artifact` stale, across lists and per-id
    /// entries.
    pub fn invalidate_artifacts(&self) {
        let tag = [Tag::new(tags::ARTIFACT)];
        self.lists.invalidate(&tag);
        self.singles.invalidate(&tag);
    }

    /// Drop every cache unconditionally — the scan screen does this on
    /// entry so a prior session can never satisfy a new scan.
    pub fn reset(&self) {
        self.lists.reset_all();
        self.singles.reset_all();
        self.targets.reset_all();
    }

    /// Invalidation/reset notifications for artifact list entries.
    pub fn subscribe_artifacts(&self) -> broadcast::Receiver<CacheEvent> {
        self.lists.subscribe()
    }

    /// Invalidation/reset notifications for target bundle entries.
    pub fn subscribe_targets(&self) -> broadcast::Receiver<CacheEvent> {
        self.targets.subscribe()
    }
}
