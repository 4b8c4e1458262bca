use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::provider::ProviderConfig;
use crate::state::AppState;
use crate::store::HistoryEntry;

const MASK_PREFIX: &str = "****";

/// GET /api/v1/settings
/// The key is masked; clients echo the mask back to keep the stored key.
pub async fn handle_get_settings(State(state): State<AppState>) -> Json<ProviderConfig> {
    Json(state.store.load_settings().await.redacted())
}

/// PUT /api/v1/settings
pub async fn handle_put_settings(
    State(state): State<AppState>,
    Json(mut incoming): Json<ProviderConfig>,
) -> Result<Json<ProviderConfig>, AppError> {
    if incoming.model_name.trim().is_empty() {
        return Err(AppError::Validation("Model name is required".to_string()));
    }
    if incoming.api_key.starts_with(MASK_PREFIX) {
        incoming.api_key = state.store.load_settings().await.api_key;
    }

    state.store.save_settings(&incoming).await?;
    info!(
        "Provider settings updated: {:?} model {}",
        incoming.provider, incoming.model_name
    );
    Ok(Json(incoming.redacted()))
}

/// GET /api/v1/history
pub async fn handle_get_history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    Json(state.store.load_history().await)
}

/// DELETE /api/v1/history
pub async fn handle_clear_history(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.clear_history().await?;
    info!("History cleared");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::llm_client::provider::ProviderKind;
    use crate::routes::build_router;
    use crate::store::HistoryResult;

    fn put_settings(body: Value) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri("/api/v1/settings")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_settings_are_masked_and_mask_keeps_key() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path()).await;
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(put_settings(json!({
                "provider": "GROQ",
                "apiKey": "gsk-secret-1234",
                "modelName": "llama-3.3-70b-versatile"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["apiKey"], "****1234");

        let response = app
            .oneshot(put_settings(json!({
                "provider": "GROQ",
                "apiKey": "****1234",
                "modelName": "llama-3.1-8b-instant"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stored = state.store.load_settings().await;
        assert_eq!(stored.provider, ProviderKind::Groq);
        assert_eq!(stored.api_key, "gsk-secret-1234");
        assert_eq!(stored.model_name, "llama-3.1-8b-instant");
    }

    #[tokio::test]
    async fn test_blank_model_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(AppState::for_tests(dir.path()).await);

        let response = app
            .oneshot(put_settings(json!({"provider": "OPENAI", "apiKey": "", "modelName": " "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_list_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::for_tests(dir.path()).await;
        state
            .store
            .push_history(HistoryEntry::new(
                HistoryResult::Analysis(Default::default()),
                None,
                None,
            ))
            .await
            .unwrap();
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["result"]["kind"], "analysis");

        let response = app
            .oneshot(
                Request::delete("/api/v1/history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.store.load_history().await.is_empty());
    }
}
