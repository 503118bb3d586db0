use std::sync::Arc;

use crate::auth::{TokenError, TokenService};
use crate::config::AppConfig;
use crate::database::{CredentialStore, PgCredentialStore, StoreError};
use crate::services::RegistroService;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("token service: {0}")]
    Tokens(#[from] TokenError),

    #[error("credential store: {0}")]
    Store(#[from] StoreError),
}

/// Shared handler state. Cloned per request; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub store: Arc<dyn CredentialStore>,
    pub registros: RegistroService,
}

impl AppState {
    /// Wire the production PostgreSQL store.
    pub fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let store = PgCredentialStore::new(&config.database.url)?;
        Self::new(config, Arc::new(store))
    }

    /// Wire an arbitrary store; the secret still comes from the configuration.
    pub fn new(config: AppConfig, store: Arc<dyn CredentialStore>) -> Result<Self, StartupError> {
        let tokens = Arc::new(TokenService::new(&config.security.secret_key)?);
        let registros = RegistroService::new(Arc::clone(&store), Arc::clone(&tokens));

        Ok(Self {
            config: Arc::new(config),
            tokens,
            store,
            registros,
        })
    }
}
