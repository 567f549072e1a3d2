//! Axum surface: a fallback route feeding every request through the dispatcher.

use crate::config::UriSource;
use crate::error::AppError;
use crate::router::dispatch;
use crate::state::AppState;
use axum::{
    extract::State,
    http::Uri,
    response::Response,
    Router,
};

/// A router whose fallback hands every unmatched request to the front
/// controller. Mount it at the root, or nest it under a prefix and use
/// `UriSource::UrlParam`/`QueryString` to keep paths stable.
pub fn front_router(state: AppState) -> Router {
    Router::new().fallback(front).with_state(state)
}

async fn front(State(state): State<AppState>, uri: Uri) -> Result<Response, AppError> {
    let path = request_path(&uri, state.config.uri_source);
    dispatch(
        &state.registry,
        &state.routes,
        &state.config.default_controller,
        &state.config.default_method,
        &path,
    )
    .await
}

/// Extract the router's path string from the request URI per the configured
/// source. An unavailable source yields the empty path, which resolves
/// entirely to the configured defaults.
pub fn request_path(uri: &Uri, source: UriSource) -> String {
    match source {
        UriSource::RequestPath => uri.path().trim_matches('/').to_string(),
        UriSource::QueryString => uri
            .query()
            .unwrap_or("")
            .trim_end_matches('/')
            .to_string(),
        UriSource::UrlParam => uri
            .query()
            .and_then(|q| {
                q.split('&')
                    .find_map(|pair| pair.strip_prefix("url="))
            })
            .unwrap_or("")
            .trim_end_matches('/')
            .to_string(),
    }
}
