use axum::{extract::State, Extension};

use crate::api::format::NormalizedRecord;
use crate::handlers::protected::authenticate;
use crate::middleware::{ApiResponse, ApiResult, BearerToken};
use crate::state::AppState;

/// GET /api/registros - every record, normalized.
pub async fn list_get(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
) -> ApiResult<Vec<NormalizedRecord>> {
    authenticate(&state, &token)?;
    let records = state.registros.list().await?;
    Ok(ApiResponse::success(records))
}
