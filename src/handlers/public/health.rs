use axum::{extract::State, response::IntoResponse, Json};
use futures::future::BoxFuture;
use serde_json::json;
use tracing::error;

use crate::error::ApiError;
use crate::services::run_all;
use crate::state::AppState;

/// GET /health - probe the store and the token service concurrently.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let checks: Vec<BoxFuture<'_, Result<&'static str, ApiError>>> = vec![
        Box::pin(async {
            state.store.ping().await.map(|_| "database").map_err(|e| {
                error!("Health check: database unavailable: {}", e);
                ApiError::service_unavailable("database unavailable")
            })
        }),
        Box::pin(async {
            state.tokens.self_check().map(|_| "tokens").map_err(|e| {
                error!("Health check: token service failed: {}", e);
                ApiError::service_unavailable("token service unavailable")
            })
        }),
    ];

    match run_all(checks).await {
        Ok(passed) => Json(json!({ "status": "ok", "checks": passed })).into_response(),
        Err(e) => e.into_response(),
    }
}
