pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::audit::handlers as audit;
use crate::audit::upload::MAX_FILE_BYTES;
use crate::proxy::handlers as proxy;
use crate::state::AppState;
use crate::store::handlers as store;

/// Room for a comparison with several maximum-size candidate files.
const AUDIT_BODY_LIMIT: usize = 6 * MAX_FILE_BYTES;
/// Relay payloads carry files as base64, a third larger than the raw bytes.
const RELAY_BODY_LIMIT: usize = 2 * MAX_FILE_BYTES;

pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route(
            "/api/v1/audit/:action",
            post(audit::handle_audit).layer(DefaultBodyLimit::max(AUDIT_BODY_LIMIT)),
        )
        .route("/api/v1/status", get(audit::handle_status))
        .route(
            "/api/v1/settings",
            get(store::handle_get_settings).put(store::handle_put_settings),
        )
        .route(
            "/api/v1/history",
            get(store::handle_get_history).delete(store::handle_clear_history),
        )
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(v1)
        // Sets its own CORS headers; see proxy::handlers.
        .route(
            "/api/analyze",
            any(proxy::handle_analyze).layer(DefaultBodyLimit::max(RELAY_BODY_LIMIT)),
        )
        .with_state(state)
}
