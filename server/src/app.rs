use std::path::Path;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState, static_dir: &str) -> Router {
    let static_assets = Router::new()
        .fallback_service(
            ServeDir::new(static_dir)
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let app = Router::new()
        .route(
            "/api/boundaries",
            axum::routing::get(routes::api::get_boundaries),
        )
        .route("/api/health", axum::routing::get(routes::api::health));

    app.layer(CompressionLayer::new())
        .fallback_service(static_assets)
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

const IMMUTABLE: &str = "public, max-age=31536000, immutable";
const ONE_DAY: &str = "public, max-age=86400";

/// Unversioned static paths that are still safe to cache for a day.
const DAY_CACHED_PREFIXES: &[&str] = &["/data/", "/fonts/"];

fn cache_control_for_path(path: &str) -> Option<&'static str> {
    let file = Path::new(path);
    let ext = file.extension().and_then(|ext| ext.to_str());
    let stem = file.file_stem().and_then(|stem| stem.to_str());
    if let (Some("wasm" | "js" | "css"), Some(stem)) = (ext, stem)
        && has_content_hash(stem)
    {
        return Some(IMMUTABLE);
    }

    DAY_CACHED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
        .then_some(ONE_DAY)
}

/// Trunk appends a hex digest to bundle names (`leakmap-client-<hash>_bg`).
fn has_content_hash(stem: &str) -> bool {
    stem.split(['-', '_', '.'])
        .any(|part| part.len() >= 8 && part.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_bundles_cache_forever() {
        assert_eq!(
            cache_control_for_path("/leakmap-client-9c1e40d2b7a35f18_bg.wasm"),
            Some(IMMUTABLE)
        );
        assert_eq!(
            cache_control_for_path("/leakmap-client-9c1e40d2b7a35f18.js"),
            Some(IMMUTABLE)
        );
    }

    #[test]
    fn data_and_fonts_cache_for_a_day() {
        assert_eq!(
            cache_control_for_path("/data/districts.geojson"),
            Some(ONE_DAY)
        );
        assert_eq!(
            cache_control_for_path("/fonts/inter-regular.woff2"),
            Some(ONE_DAY)
        );
    }

    #[test]
    fn pages_and_unhashed_bundles_keep_default_caching() {
        assert_eq!(cache_control_for_path("/"), None);
        assert_eq!(cache_control_for_path("/index.html"), None);
        assert_eq!(cache_control_for_path("/leakmap-client.js"), None);
    }

    #[tokio::test]
    async fn unknown_api_path_falls_through_to_static_assets() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        use crate::config::BoundarySource;

        let state = AppState::with_source(BoundarySource::File("unused.geojson".to_owned()));
        let app = build_app(state, "/nonexistent/static");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/unknown")
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }
}
