use axum::{
    extract::{Path, State},
    Extension,
};

use crate::handlers::protected::authenticate;
use crate::middleware::{ApiResponse, ApiResult, BearerToken, Confirmation};
use crate::state::AppState;
use crate::validation::parse_path_id;

/// DELETE /api/registros/:id
pub async fn delete_by_id(
    State(state): State<AppState>,
    Extension(token): Extension<BearerToken>,
    Path(raw_id): Path<String>,
) -> ApiResult<Confirmation> {
    authenticate(&state, &token)?;
    let id = parse_path_id(&raw_id)?;
    let confirmation = state.registros.delete(id).await?;
    Ok(ApiResponse::success(confirmation))
}
