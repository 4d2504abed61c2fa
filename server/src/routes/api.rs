use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use crate::state::AppState;

const GEOJSON_CONTENT_TYPE: &str = "application/geo+json";
const BOUNDARIES_CACHE_CONTROL: &str = "public, max-age=300";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (features, last_refresh) = match state.boundaries.read().await.as_ref() {
        Some(cached) => (cached.features, Some(cached.fetched_at.to_rfc3339())),
        None => (0, None),
    };
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": if last_refresh.is_some() { "ok" } else { "loading" },
        "features": features,
        "last_refresh": last_refresh,
        "source": state.boundary_source.to_string(),
        "observability": {
            "boundary_requests_total": observability.boundary_requests_total,
            "boundary_not_modified_total": observability.boundary_not_modified_total,
            "refresh_failures_total": observability.refresh_failures_total,
        }
    }))
}

/// Serve the cached boundary payload byte-for-byte.
pub async fn get_boundaries(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.observability.record_boundary_request();
    let cached = {
        let slot = state.boundaries.read().await;
        slot.as_ref().map(|c| (c.etag.clone(), c.body.clone()))
    };
    let Some((etag, body)) = cached else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, "5")],
            Json(serde_json::json!({ "error": "boundary dataset not loaded yet" })),
        )
            .into_response();
    };

    if etag_matches_any(&headers, &etag) {
        state.observability.record_boundary_not_modified();
        let response = StatusCode::NOT_MODIFIED.into_response();
        return with_validators(response, BOUNDARIES_CACHE_CONTROL, &etag);
    }

    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(GEOJSON_CONTENT_TYPE),
    );
    with_validators(response, BOUNDARIES_CACHE_CONTROL, &etag)
}

/// Attach the cache headers shared by 200 and 304 responses.
fn with_validators(mut response: Response, cache_control: &'static str, etag: &str) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, value);
    }
    response
}

/// Weak comparison per RFC 9110: `W/` prefixes are ignored and `*` matches.
fn etag_matches_any(headers: &HeaderMap, etag: &str) -> bool {
    let strip = |tag: &str| tag.trim().trim_start_matches("W/").to_owned();
    let wanted = strip(etag);
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || strip(candidate) == wanted)
}
