pub mod auth;
pub mod response;

pub use auth::{require_bearer, BearerToken};
pub use response::{ApiResponse, ApiResult, Confirmation, TokenResponse};
