// Two tiers: public (no token) and protected (bearer token, verified in the handler).
pub mod protected;
pub mod public;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::{Map, Value};

use crate::error::ApiError;

pub(crate) const INVALID_JSON: &str = "El cuerpo de la solicitud no es un JSON válido";

/// Unwrap a JSON body, turning extractor rejections into a 400 with a fixed message.
///
/// A request without a JSON content type carries no parsed body and is validated as `{}`,
/// so the caller sees which field is missing. A JSON body that fails to parse is a 400.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(Value::Object(Map::new())),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            Err(ApiError::bad_request(INVALID_JSON))
        }
    }
}
