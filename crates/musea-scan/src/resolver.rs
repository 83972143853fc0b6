//! Scan-to-artifact resolution
//!
//! One resolver per scan surface. Opening the surface resets every cache
//! (a prior visit must never satisfy a new scan), each resolution
//! invalidates artifact entries before querying, and a miss gets one grace
//! re-query before it becomes a hard not-found.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use musea_api::{CatalogApi, CatalogStore};
use musea_catalog::{Artifact, FilterRequest};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use crate::error::{ScanError, ScanResult};
use crate::qr;

#[derive(Debug, Clone)]
pub struct ScanPolicy {
    /// How long to wait before the single re-query when the first lookup
    /// comes back empty.
    pub not_found_grace: Duration,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            not_found_grace: Duration::from_secs(2),
        }
    }
}

/// Clonable handle on one scan surface; clones share focus state.
pub struct ScanResolver<A> {
    store: CatalogStore<A>,
    policy: ScanPolicy,
    focused: Arc<AtomicBool>,
}

impl<A> Clone for ScanResolver<A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            policy: self.policy.clone(),
            focused: Arc::clone(&self.focused),
        }
    }
}

impl<A: CatalogApi> ScanResolver<A> {
    pub fn new(store: CatalogStore<A>, policy: ScanPolicy) -> Self {
        Self {
            store,
            policy,
            focused: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The scan surface gained focus. Drops every cache so this session
    /// starts from the backend's current state.
    pub fn begin_session(&self) {
        self.focused.store(true, Ordering::SeqCst);
        self.store.reset();
        info!("scan session started");
    }

    /// The scan surface lost focus; in-flight resolutions end in
    /// [`ScanError::Dismissed`].
    pub fn dismiss(&self) {
        self.focused.store(false, Ordering::SeqCst);
        debug!("scan session dismissed");
    }

    pub fn is_active(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    /// Resolve one scanned code to its artifact.
    #[instrument(skip(self))]
    pub async fn resolve(&self, code: &str) -> ScanResult<Artifact> {
        if !self.is_active() {
            return Err(ScanError::Dismissed);
        }
        let id = qr::extract_artifact_id(code)?;
        let request = FilterRequest::by_id(&id);

        let first = self.lookup(&request).await?;
        if !self.is_active() {
            return Err(ScanError::Dismissed);
        }
        if let Some(artifact) = first {
            return Ok(artifact);
        }

        // Freshly published records can lag behind their printed codes.
        debug!(%id, grace = ?self.policy.not_found_grace, "no match, scheduling one re-query");
        sleep(self.policy.not_found_grace).await;
        if !self.is_active() {
            return Err(ScanError::Dismissed);
        }
        let second = self.lookup(&request).await?;
        // The surface may have been torn down while the re-query ran; a
        // late hit must not be applied to it.
        if !self.is_active() {
            return Err(ScanError::Dismissed);
        }
        second.ok_or(ScanError::NotFound)
    }

    /// One fresh lookup: stale-marks artifact entries first so the cache
    /// cannot answer from a previous scan.
    async fn lookup(&self, request: &FilterRequest) -> ScanResult<Option<Artifact>> {
        self.store.invalidate_artifacts();
        let hits = self.store.filter(request).await?;
        Ok(hits.into_iter().next())
    }
}
