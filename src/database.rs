//! Lazily connected PostgreSQL handle.
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "violet";
pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 5;

/// Shared database handle.
///
/// The pool is created on first use. Concurrent first uses wait on the
/// same connection attempt, and a failed attempt leaves the cell empty so
/// the next request tries again.
#[derive(Clone)]
pub struct Database {
    url: Arc<str>,
    options: PgPoolOptions,
    pool: Arc<OnceCell<PgPool>>,
}

impl Database {
    /// Prepare a database handle without connecting.
    pub fn new(url: &str, pool_size: u32, connect_timeout: Duration) -> Self {
        let options = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(connect_timeout);

        Self {
            url: Arc::from(url),
            options,
            pool: Arc::new(OnceCell::new()),
        }
    }

    /// Wrap an already connected pool.
    #[cfg(test)]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            url: Arc::from(""),
            options: PgPoolOptions::new(),
            pool: Arc::new(OnceCell::new_with(Some(pool))),
        }
    }

    /// Get the connection pool, connecting and migrating on first call.
    pub async fn pool(&self) -> Result<&PgPool, sqlx::Error> {
        self.pool.get_or_try_init(|| self.connect()).await
    }

    /// Whether a connection has already been established.
    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        let pool = self.options.clone().connect(&self.url).await?;

        // execute migrations scripts on first connection.
        sqlx::migrate!().run(&pool).await?;

        tracing::info!(
            max_connections = self.options.get_max_connections(),
            "postgres connected"
        );

        Ok(pool)
    }
}
