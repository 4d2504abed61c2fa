use leakmap_shared::{BoundaryCollection, BoundaryLoadError, NameKeys, collection_from_response};

pub const DEFAULT_BOUNDARY_URL: &str = "/api/boundaries";

pub fn boundary_url(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BOUNDARY_URL)
        .to_string()
}

/// One GET, no retry. Transport errors and non-2xx statuses are network
/// failures; anything the parser rejects is a parse failure.
pub async fn fetch_boundaries(
    url: &str,
    keys: &NameKeys,
) -> Result<BoundaryCollection, BoundaryLoadError> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| BoundaryLoadError::network(format!("fetch error: {e}")))?;
    if !resp.ok() {
        return Err(BoundaryLoadError::status(resp.status()));
    }
    let body = resp
        .binary()
        .await
        .map_err(|e| BoundaryLoadError::network(format!("read error: {e}")))?;
    collection_from_response(resp.status(), &body, keys)
}

#[cfg(target_arch = "wasm32")]
pub fn report_load(result: &Result<BoundaryCollection, BoundaryLoadError>, url: &str) {
    match result {
        Ok(collection) => web_sys::console::info_1(
            &format!(
                "boundaries loaded from {url}: {} features ({})",
                collection.len(),
                collection.id()
            )
            .into(),
        ),
        Err(e) => web_sys::console::warn_1(&format!("boundary load failed ({url}): {e}").into()),
    }
}

#[cfg(target_arch = "wasm32")]
pub fn report_dropped(dropped: &[usize]) {
    if dropped.is_empty() {
        return;
    }
    web_sys::console::warn_1(
        &format!(
            "{} degenerate boundary features skipped: {dropped:?}",
            dropped.len()
        )
        .into(),
    );
}

#[cfg(not(target_arch = "wasm32"))]
pub fn report_load(_result: &Result<BoundaryCollection, BoundaryLoadError>, _url: &str) {}

#[cfg(not(target_arch = "wasm32"))]
pub fn report_dropped(_dropped: &[usize]) {}
