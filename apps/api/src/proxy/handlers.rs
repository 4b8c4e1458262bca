use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::proxy::{is_valid_model, RelayError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub model: String,
    #[serde(default)]
    pub payload: Value,
}

/// First `x-forwarded-for` entry, else the peer address, else `unknown`.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Browsers call this endpoint cross-origin with credentials, which the CORS layer
/// refuses to combine with a wildcard origin, so the headers are set here.
fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// ANY /api/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    method: Method,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    with_cors(analyze(&state, method, peer.map(|c| c.0), &headers, &body).await)
}

async fn analyze(
    state: &AppState,
    method: Method,
    peer: Option<SocketAddr>,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if method != Method::POST {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    let ip = client_ip(headers, peer);
    let usage = state.limiter.check(&ip).await;
    if !usage.allowed() {
        warn!("Daily limit reached for {ip} ({} requests)", usage.count);
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Daily Limit Reached. Add your own API Key in Settings to continue.",
        );
    }

    if !state.relay.has_key() {
        error!("Relay called without a server Gemini key");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::MissingKey.to_string(),
        );
    }

    let request: AnalyzeRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid request body: {e}"))
        }
    };
    if !is_valid_model(&request.model) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid model name");
    }

    match state.relay.forward(&request.model, &request.payload).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(RelayError::Upstream { status, body }) => {
            warn!("Upstream returned {status}");
            let status =
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            error_response(status, format!("Provider Error: {body}"))
        }
        Err(e) => {
            error!("Proxy error: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
