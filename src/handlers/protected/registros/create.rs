use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde_json::Value;

use crate::handlers::{json_body, protected::authenticate};
use crate::middleware::{ApiResponse, ApiResult, BearerToken, Confirmation};
use crate::state::AppState;

/// POST /api/registros
pub async fn create_post(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Confirmation> {
    authenticate(&state, &token)?;
    let body = json_body(body)?;
    let confirmation = state.registros.create(&body).await?;
    Ok(ApiResponse::created(confirmation))
}
