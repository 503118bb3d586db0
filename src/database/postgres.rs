use std::str::FromStr;

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection};
use sqlx::query::Query;
use sqlx::{Connection, Executor, Postgres, Transaction};
use tracing::{debug, warn};

use super::row::{decode_row, DecodedRow};
use super::store::{CredentialStore, OutputShape, Param, ProcedureCall, RawResult, StoreError, CURSOR_NAME};

/// PostgreSQL-backed store. Opens a fresh connection for every call; nothing is pooled.
pub struct PgCredentialStore {
    options: PgConnectOptions,
}

impl PgCredentialStore {
    /// Parses the URL up front so a bad setting fails at startup, not on the first request.
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let options = PgConnectOptions::from_str(database_url).map_err(StoreError::Connect)?;
        Ok(Self { options })
    }

    /// Acquire a connection, run one unit of work, and close the connection on every exit path.
    async fn with_connection<T, F>(&self, procedure: &'static str, work: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, sqlx::Error>> + Send,
    {
        let mut conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(StoreError::Connect)?;

        let outcome = work(&mut conn).await;

        if let Err(e) = conn.close().await {
            warn!("Failed to close connection after {}: {}", procedure, e);
        }

        outcome.map_err(|source| StoreError::Procedure { procedure, source })
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn call(&self, call: ProcedureCall) -> Result<RawResult, StoreError> {
        let procedure = call.procedure.name();
        let output = call.output();
        let statement = call.statement();
        let params = call.params;

        debug!("Calling {} with {} bound parameters", procedure, params.len());

        match output {
            OutputShape::Nothing => {
                self.with_connection(procedure, move |conn| {
                    Box::pin(async move {
                        bind_params(sqlx::query(&statement), params)
                            .execute(&mut *conn)
                            .await?;
                        Ok(RawResult::Committed)
                    })
                })
                .await
            }
            OutputShape::Cursor => {
                let rows = self
                    .with_connection(procedure, move |conn| Box::pin(fetch_cursor(conn, statement, params)))
                    .await?;
                debug!("{} returned {} rows", procedure, rows.len());
                Ok(RawResult::Rows(rows))
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_connection("ping", |conn| {
            Box::pin(async move {
                sqlx::query("SELECT 1").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .await
    }
}

/// Cursors only live inside a transaction: call, fetch, close, commit.
async fn fetch_cursor(
    conn: &mut PgConnection,
    statement: String,
    params: Vec<Param>,
) -> Result<Vec<DecodedRow>, sqlx::Error> {
    let mut tx = conn.begin().await?;

    match read_cursor(&mut tx, &statement, params).await {
        Ok(rows) => {
            tx.commit().await?;
            Ok(rows)
        }
        Err(e) => {
            // rollback releases the cursor if CLOSE never ran
            if let Err(rollback) = tx.rollback().await {
                warn!("Rollback after cursor failure also failed: {}", rollback);
            }
            Err(e)
        }
    }
}

async fn read_cursor(
    tx: &mut Transaction<'_, Postgres>,
    statement: &str,
    params: Vec<Param>,
) -> Result<Vec<DecodedRow>, sqlx::Error> {
    bind_params(sqlx::query(statement), params)
        .execute(&mut **tx)
        .await?;

    let fetch = format!("FETCH ALL FROM {}", CURSOR_NAME);
    let close = format!("CLOSE {}", CURSOR_NAME);

    let fetched = (&mut **tx).fetch_all(fetch.as_str()).await;
    let closed = (&mut **tx).execute(close.as_str()).await;

    let rows = fetched?;
    closed?;

    rows.iter().map(decode_row).collect()
}

/// Integers bind as INT8, so procedure id parameters are declared `bigint`.
fn bind_params(mut query: Query<'_, Postgres, PgArguments>, params: Vec<Param>) -> Query<'_, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Param::Int(v) => query.bind(v),
            Param::Text(v) => query.bind(v),
        };
    }
    query
}
