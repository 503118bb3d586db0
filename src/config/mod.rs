use std::env;
use std::fmt;

use thiserror::Error;

/// Errors raised while assembling configuration at startup. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    MissingVar(&'static str),

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Invalid port: {0}")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log_filter: String,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    /// Full postgres connection URL, credentials included.
    pub url: String,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub secret_key: String,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let mut config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        };

        if let Some(v) = get("PORT") {
            config.server.port = v.parse().map_err(|_| ConfigError::InvalidPort(v))?;
        }
        if let Some(v) = get("RUST_LOG") {
            config.server.log_filter = v;
        }
        if let Some(v) = get("CORS_ORIGINS") {
            config.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        config.security.secret_key = get("SECRET_KEY")
            .or_else(|| get("secretKey"))
            .ok_or(ConfigError::MissingVar("SECRET_KEY"))?;

        config.database.url = match get("DATABASE_URL") {
            Some(url) => url,
            None => {
                let host = get("DB_HOST")
                    .or_else(|| get("DB_HOST_XE"))
                    .ok_or(ConfigError::MissingVar("DATABASE_URL"))?;
                build_database_url(&host, get("DB_USER").as_deref(), get("DB_PASS").as_deref())?
            }
        };

        Ok(config)
    }

    fn development() -> Self {
        Self::with_defaults(
            Environment::Development,
            "registros_gateway=debug,tower_http=debug",
            vec!["http://localhost:4200".to_string()],
        )
    }

    fn staging() -> Self {
        Self::with_defaults(Environment::Staging, "registros_gateway=info,tower_http=info", Vec::new())
    }

    fn production() -> Self {
        Self::with_defaults(Environment::Production, "registros_gateway=info", Vec::new())
    }

    fn with_defaults(environment: Environment, log_filter: &str, cors_origins: Vec<String>) -> Self {
        Self {
            environment,
            server: ServerConfig {
                port: 3000,
                log_filter: log_filter.to_string(),
            },
            database: DatabaseConfig { url: String::new() },
            security: SecurityConfig {
                secret_key: String::new(),
                cors_origins,
            },
        }
    }
}

/// Turn a `host[:port]/database` connect string plus credentials into a postgres URL.
fn build_database_url(
    connect: &str,
    user: Option<&str>,
    password: Option<&str>,
) -> Result<String, ConfigError> {
    let base = if connect.contains("://") {
        connect.to_string()
    } else {
        format!("postgres://{}", connect)
    };

    let mut url = url::Url::parse(&base).map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
    if let Some(user) = user {
        url.set_username(user)
            .map_err(|_| ConfigError::InvalidDatabaseUrl("cannot set username".to_string()))?;
    }
    if let Some(password) = password {
        url.set_password(Some(password))
            .map_err(|_| ConfigError::InvalidDatabaseUrl("cannot set password".to_string()))?;
    }
    Ok(url.into())
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = match url::Url::parse(&self.url) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(Some("***"));
                url.to_string()
            }
            Ok(url) => url.to_string(),
            Err(_) => "<unparseable>".to_string(),
        };
        f.debug_struct("DatabaseConfig").field("url", &redacted).finish()
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("secret_key", &"***")
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}
