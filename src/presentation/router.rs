// Route table and ingress prefix handling
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    health_check, index, list_structure, list_users, not_found, stream_updates, update_access,
};
use axum::{
    Router,
    extract::Request,
    http::Uri,
    routing::{get, post},
};
use std::sync::Arc;
use tower::Layer;
use tower::util::{MapRequest, MapRequestLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).fallback(not_found))
        .route("/healthz", get(health_check).fallback(not_found))
        .route("/api/users", get(list_users).fallback(not_found))
        .route("/api/structure", get(list_structure).fallback(not_found))
        .route("/api/update", post(update_access).fallback(not_found))
        .route("/api/stream", get(stream_updates).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Strip `prefix` from the request path. Only whole segments match, so
/// `/ingress` does not swallow `/ingressx`.
pub fn strip_prefix(uri: &Uri, prefix: &str) -> Option<Uri> {
    let rest = uri.path().strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }

    let path = if rest.is_empty() { "/" } else { rest };
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse().ok()?);
    Uri::from_parts(parts).ok()
}

/// Wrap the router so the reverse-proxy prefix is removed before routing.
/// Requests that arrive without the prefix are routed unchanged.
pub fn with_ingress_prefix(
    router: Router,
    prefix: Option<String>,
) -> MapRequest<Router, impl FnMut(Request) -> Request + Clone> {
    MapRequestLayer::new(move |mut request: Request| {
        if let Some(prefix) = prefix.as_deref() {
            if let Some(uri) = strip_prefix(request.uri(), prefix) {
                *request.uri_mut() = uri;
            }
        }
        request
    })
    .layer(router)
}
