use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde_json::Value;

use crate::handlers::{json_body, protected::authenticate};
use crate::middleware::{ApiResponse, ApiResult, BearerToken, Confirmation};
use crate::state::AppState;

/// PUT /api/registros/:id
///
/// The record to update is identified by the body's `id`. The path segment is accepted
/// for route compatibility and not compared against it.
pub async fn update_put(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Path(_path_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Confirmation> {
    authenticate(&state, &token)?;
    let body = json_body(body)?;
    let confirmation = state.registros.update(&body).await?;
    Ok(ApiResponse::success(confirmation))
}
