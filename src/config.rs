//! Configuration manager for violet.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::AppState;
use crate::database;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_NAME: &str = "violet";
pub const DEFAULT_PORT: u16 = 8888;
/// Connection string taking precedence over the `postgres` entry.
pub const DATABASE_URL: &str = "DATABASE_URL";

/// Errors that may occur during the configuration loading process.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("URL is invalid: {0}")]
    Url(#[from] url::ParseError),
    #[error("missing `postgres` entry on `config.yaml` file or `{DATABASE_URL}` variable")]
    MissingDatabase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Public URL of current instance.
    pub url: String,
    /// Listening port, `PORT` overrides it.
    pub port: u16,
    #[serde(skip)]
    path: PathBuf,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            url: format!("http://localhost:{DEFAULT_PORT}/"),
            port: DEFAULT_PORT,
            path: PathBuf::default(),
            postgres: None,
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
    /// Seconds to wait for a connection.
    pub connect_timeout: Option<u64>,
}

impl Postgres {
    /// Build the connection string.
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}/{}",
            self.username.as_deref().unwrap_or(database::DEFAULT_CREDENTIALS),
            self.password.as_deref().unwrap_or(database::DEFAULT_CREDENTIALS),
            self.address,
            self.database.as_deref().unwrap_or(database::DEFAULT_DATABASE_NAME),
        )
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.connect_timeout
                .unwrap_or(database::DEFAULT_CONNECT_TIMEOUT),
        )
    }
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Arc<Self>, Error> {
        // an explicit path never falls back to the default location.
        let file_path = if self.path.as_os_str().is_empty() {
            Path::new(DEFAULT_CONFIG_PATH)
        } else {
            self.path.as_path()
        };

        let mut config = match File::open(file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Configuration>(file) {
                Ok(config) => config,
                Err(err) => self.error(err),
            },
            Err(err) => self.error(err),
        };

        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            config.port = port;
        }

        // normalize URLs.
        config.url = self.normalize_url(&config.url)?;

        Ok(Arc::new(config))
    }

    /// Connection string, pool size and connect timeout of the database.
    ///
    /// `DATABASE_URL` wins over the `postgres` entry.
    pub fn database(&self) -> Result<(String, u32, Duration), Error> {
        let postgres = self.postgres.clone().unwrap_or_default();

        let url = match std::env::var(DATABASE_URL) {
            Ok(url) if !url.is_empty() => url,
            _ if !postgres.address.is_empty() => postgres.connection_url(),
            _ => return Err(Error::MissingDatabase),
        };

        Ok((url, postgres.pool_size(), postgres.connect_timeout()))
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file cannot be read");
        Self::default()
    }
}
