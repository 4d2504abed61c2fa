use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use leakmap_shared::CollectionId;
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::{BoundarySource, boundary_source, upstream_connect_timeout, upstream_http_timeout};

/// Last validated boundary payload. The raw bytes are served as-is so clients
/// parse exactly what the loader validated.
#[derive(Debug, Clone)]
pub struct CachedBoundaries {
    pub body: Bytes,
    pub etag: String,
    pub features: usize,
    pub fetched_at: DateTime<Utc>,
}

impl CachedBoundaries {
    pub fn new(body: Bytes, id: CollectionId, fetched_at: DateTime<Utc>) -> Self {
        Self {
            body,
            etag: boundaries_etag(id),
            features: id.features,
            fetched_at,
        }
    }
}

pub fn boundaries_etag(id: CollectionId) -> String {
    format!("\"boundaries-{id}\"")
}

#[derive(Clone)]
pub struct AppState {
    /// None until the first successful load.
    pub boundaries: Arc<RwLock<Option<CachedBoundaries>>>,
    pub boundary_source: BoundarySource,
    pub http_client: reqwest::Client,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    boundary_requests_total: AtomicU64,
    boundary_not_modified_total: AtomicU64,
    refresh_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub boundary_requests_total: u64,
    pub boundary_not_modified_total: u64,
    pub refresh_failures_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            boundary_requests_total: self.boundary_requests_total.load(Ordering::Relaxed),
            boundary_not_modified_total: self.boundary_not_modified_total.load(Ordering::Relaxed),
            refresh_failures_total: self.refresh_failures_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_boundary_request(&self) {
        self.boundary_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_boundary_not_modified(&self) {
        self.boundary_not_modified_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_failure(&self) {
        self.refresh_failures_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_source(boundary_source())
    }

    pub fn with_source(boundary_source: BoundarySource) -> Self {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("leakmap/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            boundaries: Arc::new(RwLock::new(None)),
            boundary_source,
            http_client,
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
