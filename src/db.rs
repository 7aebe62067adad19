use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::entities::product;
use crate::errors::StoreError;
use crate::store::{InMemoryProductStore, ProductStore, SqlProductStore};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        // Every connection to `sqlite::memory:` opens its own private database.
        let max_connections = if is_sqlite_memory(&url) { 1 } else { 10 };
        Self {
            url,
            max_connections,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

fn is_sqlite_memory(url: &str) -> bool {
    url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

/// Establishes a connection pool with custom settings
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, StoreError> {
    debug!(max_connections = config.max_connections, "Configuring database connection");

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    let db_pool = Database::connect(opt).await?;
    info!(backend = ?db_pool.get_database_backend(), "Database connection established");
    Ok(db_pool)
}

pub async fn establish_connection(database_url: &str) -> Result<DbPool, StoreError> {
    establish_connection_with_config(&DbConfig::new(database_url)).await
}

/// Creates the `products` table when it does not exist yet.
pub async fn ensure_schema(db: &DbPool) -> Result<(), StoreError> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(product::Entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

/// Picks the product store backend from configuration.
///
/// No `database_url` means an in-process store that lives as long as the server.
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn ProductStore>, StoreError> {
    match config.database_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            let db = establish_connection(url).await?;
            ensure_schema(&db).await?;
            Ok(Arc::new(SqlProductStore::new(Arc::new(db))))
        }
        _ => {
            info!("No database configured; using in-memory product store");
            Ok(Arc::new(InMemoryProductStore::new()))
        }
    }
}
