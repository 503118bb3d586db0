pub mod registros;

use tracing::debug;

use crate::auth::Subject;
use crate::error::ApiError;
use crate::middleware::BearerToken;
use crate::state::AppState;

/// Second stage of the bearer check: signature and expiry.
///
/// Runs before the body is looked at, so a bad token always wins over a bad payload.
pub(crate) fn authenticate(state: &AppState, token: &BearerToken) -> Result<Subject, ApiError> {
    let subject = state.tokens.verify(token.as_str())?;
    debug!("Authenticated user {}", subject);
    Ok(subject)
}
