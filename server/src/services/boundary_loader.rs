use std::error::Error;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use leakmap_shared::{NameKeys, boundary::parse_feature_collection};
use tracing::{info, warn};

use crate::config::BoundarySource;
use crate::state::{AppState, CachedBoundaries, boundaries_etag};

type LoadError = Box<dyn Error + Send + Sync>;

pub async fn run(state: AppState, refresh: Duration) {
    let mut interval = tokio::time::interval(refresh);
    let keys = NameKeys::default();

    // First tick fires immediately so the cache fills at startup.
    loop {
        interval.tick().await;

        match refresh_once(&state, &keys).await {
            Ok(features) => {
                info!(features, source = %state.boundary_source, "boundary cache refreshed");
            }
            Err(e) => {
                state.observability.record_refresh_failure();
                let serving = state.boundaries.read().await.is_some();
                warn!(
                    error = %e,
                    source = %state.boundary_source,
                    serving_previous = serving,
                    "failed to refresh boundary dataset"
                );
            }
        }
    }
}

/// Fetch, validate and publish one payload. The cache is only touched once the
/// payload parses, so a failed refresh leaves the last good one in place.
pub async fn refresh_once(state: &AppState, keys: &NameKeys) -> Result<usize, LoadError> {
    let body = fetch_source(&state.http_client, &state.boundary_source).await?;
    let collection = parse_feature_collection(&body, keys)?;
    if collection.is_empty() {
        return Err("boundary dataset has no polygon features".into());
    }

    let id = collection.id();
    let mut slot = state.boundaries.write().await;
    match slot.as_mut() {
        Some(cached) if cached.etag == boundaries_etag(id) => {
            cached.fetched_at = Utc::now();
        }
        _ => {
            *slot = Some(CachedBoundaries::new(body, id, Utc::now()));
        }
    }
    Ok(id.features)
}

async fn fetch_source(client: &reqwest::Client, source: &BoundarySource) -> Result<Bytes, LoadError> {
    match source {
        BoundarySource::Url(url) => {
            let resp = client.get(url).send().await?.error_for_status()?;
            Ok(resp.bytes().await?)
        }
        BoundarySource::File(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/districts.geojson");

    #[tokio::test]
    async fn loads_bundled_dataset_from_file() {
        let state = AppState::with_source(BoundarySource::File(DEMO_PATH.to_owned()));
        let features = refresh_once(&state, &NameKeys::default())
            .await
            .expect("demo dataset should load");
        assert_eq!(features, 11);

        let cached = state.boundaries.read().await.clone().expect("cache filled");
        assert_eq!(cached.features, 11);
        assert!(cached.etag.starts_with("\"boundaries-"));
        assert!(!cached.body.is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_payload() {
        let mut state = AppState::with_source(BoundarySource::File(DEMO_PATH.to_owned()));
        refresh_once(&state, &NameKeys::default())
            .await
            .expect("demo dataset should load");
        let before = state.boundaries.read().await.clone().expect("cache filled");

        state.boundary_source = BoundarySource::File("/nonexistent/districts.geojson".to_owned());
        assert!(refresh_once(&state, &NameKeys::default()).await.is_err());

        let after = state.boundaries.read().await.clone().expect("cache kept");
        assert_eq!(after.etag, before.etag);
        assert_eq!(after.body, before.body);
    }

    #[tokio::test]
    async fn unchanged_payload_only_bumps_refresh_time() {
        let state = AppState::with_source(BoundarySource::File(DEMO_PATH.to_owned()));
        let keys = NameKeys::default();
        refresh_once(&state, &keys).await.expect("first load");
        let first = state.boundaries.read().await.clone().expect("cache filled");
        refresh_once(&state, &keys).await.expect("second load");
        let second = state.boundaries.read().await.clone().expect("cache filled");

        assert_eq!(first.etag, second.etag);
        assert!(second.fetched_at >= first.fetched_at);
    }
}
