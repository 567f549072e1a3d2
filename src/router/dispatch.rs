//! Dispatch: remap, resolve, and invoke the controller method.

use crate::error::AppError;
use crate::router::registry::ControllerRegistry;
use crate::router::remap::RouteTable;
use crate::router::resolve::resolve;
use axum::response::Response;

/// Run one request path through the full pipeline. The resolved controller
/// must exist in the registry and expose the resolved method (resolution
/// already falls back to the defaults; a miss here means the defaults
/// themselves are unregistered, which is a configuration error surfaced to
/// the caller).
pub async fn dispatch(
    registry: &ControllerRegistry,
    routes: &RouteTable,
    default_controller: &str,
    default_method: &str,
    path: &str,
) -> Result<Response, AppError> {
    let rewritten = routes.remap(path);
    let resolution = resolve(&rewritten, registry, default_controller, default_method);
    tracing::debug!(
        path = %path,
        rewritten = %rewritten,
        controller = %resolution.controller,
        method = %resolution.method,
        params = ?resolution.params,
        "dispatch"
    );

    let controller = registry
        .get(&resolution.controller)
        .ok_or_else(|| AppError::ControllerNotFound(resolution.controller.clone()))?;
    if !controller.methods().iter().any(|m| *m == resolution.method) {
        return Err(AppError::MethodNotFound {
            controller: resolution.controller,
            method: resolution.method,
        });
    }
    controller.call(&resolution.method, &resolution.params).await
}
