#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::Error as SqlxError;

use registros_gateway::auth::{Subject, TokenService};
use registros_gateway::config::AppConfig;
use registros_gateway::database::{
    Cell, CredentialStore, DecodedRow, OutputShape, ProcedureCall, RawResult, StoreError,
};
use registros_gateway::{app, AppState};

pub const SECRET: &str = "integration-secret";

/// In-memory store that records every call it receives.
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<ProcedureCall>>,
    login_rows: Mutex<Vec<DecodedRow>>,
    list_rows: Mutex<Vec<DecodedRow>>,
    failing: Mutex<bool>,
}

impl RecordingStore {
    pub fn with_login_id(self, id: i64) -> Self {
        *self.login_rows.lock().unwrap() = vec![DecodedRow::from_pairs([("ID", Cell::Integer(id))])];
        self
    }

    pub fn with_list_rows(self, rows: Vec<DecodedRow>) -> Self {
        *self.list_rows.lock().unwrap() = rows;
        self
    }

    pub fn failing(self) -> Self {
        *self.failing.lock().unwrap() = true;
        self
    }

    pub fn calls(&self) -> Vec<ProcedureCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialStore for RecordingStore {
    async fn call(&self, call: ProcedureCall) -> Result<RawResult, StoreError> {
        let procedure = call.procedure.name();
        let output = call.output();
        self.calls.lock().unwrap().push(call.clone());

        if *self.failing.lock().unwrap() {
            return Err(StoreError::Procedure {
                procedure,
                source: SqlxError::Protocol("relation \"usuarios\" does not exist".to_string()),
            });
        }

        Ok(match output {
            OutputShape::Nothing => RawResult::Committed,
            OutputShape::Cursor if procedure == "sp_login_user" => {
                RawResult::Rows(self.login_rows.lock().unwrap().clone())
            }
            OutputShape::Cursor => RawResult::Rows(self.list_rows.lock().unwrap().clone()),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if *self.failing.lock().unwrap() {
            return Err(StoreError::Connect(SqlxError::PoolTimedOut));
        }
        Ok(())
    }
}

pub struct TestApp {
    pub base_url: String,
    pub store: Arc<RecordingStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A token signed with the server's secret.
    pub fn token_for(&self, id: i64) -> String {
        tokens().issue(Subject(id)).unwrap()
    }
}

pub fn tokens() -> TokenService {
    TokenService::new(SECRET).unwrap()
}

pub fn expired_token(id: i64) -> String {
    tokens()
        .issue_at(Subject(id), Utc::now() - Duration::hours(21))
        .unwrap()
}

pub fn foreign_token(id: i64) -> String {
    TokenService::new("some-other-secret").unwrap().issue(Subject(id)).unwrap()
}

pub fn test_config() -> Result<AppConfig> {
    let config = AppConfig::from_lookup(|key| match key {
        "SECRET_KEY" => Some(SECRET.to_string()),
        "DATABASE_URL" => Some("postgres://unused@localhost/unused".to_string()),
        _ => None,
    })?;
    Ok(config)
}

/// Serve the real router on a free port, backed by `store`.
pub async fn spawn_app(store: RecordingStore) -> Result<TestApp> {
    let store = Arc::new(store);
    let state = AppState::new(test_config()?, store.clone())?;

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    Ok(TestApp {
        base_url: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    })
}
