use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, TokenResponse};
use crate::state::AppState;

/// POST /api/login - exchange `{email, password}` for a bearer token.
///
/// 400 on a malformed payload, 401 when the store finds no match, 500 when the store fails.
pub async fn login_post(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<TokenResponse> {
    let body = json_body(body)?;
    let token = state.registros.login(&body).await?;
    Ok(ApiResponse::success(token))
}
