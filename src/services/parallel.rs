use std::fmt::Display;
use std::future::Future;

use futures::future::try_join_all;

/// Run independent units of work concurrently and wait for all of them.
///
/// Results come back in input order. The first failure aborts the rest and becomes the
/// aggregate result; no partial result set is ever returned.
pub async fn run_all<I, F, T, E>(units: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let outcome = try_join_all(units).await;
    if let Err(e) = &outcome {
        tracing::warn!("Concurrent operation failed: {}", e);
    }
    outcome
}
