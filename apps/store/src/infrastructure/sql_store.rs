use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;

use crate::config::SqlSettings;
use crate::domain::errors::AppError;
use crate::domain::repositories::{SchemaMaintenance, Store, StoreResult, TeamStore};
use crate::infrastructure::repositories::SqlTeamStore;
use crate::infrastructure::schema;

/// Master and replica connection pools shared by every SQL store
///
/// Writes go to the master. Reads that may lag behind go to a replica,
/// chosen round-robin. Without replicas the master serves reads too.
#[derive(Debug)]
pub struct SqlConnections {
    master: PgPool,
    replicas: Vec<PgPool>,
    next_replica: AtomicUsize,
}

impl SqlConnections {
    pub fn new(master: PgPool, replicas: Vec<PgPool>) -> Self {
        Self {
            master,
            replicas,
            next_replica: AtomicUsize::new(0),
        }
    }

    pub fn get_master(&self) -> &PgPool {
        &self.master
    }

    pub fn get_replica(&self) -> &PgPool {
        match self.next_replica_index() {
            Some(index) => &self.replicas[index],
            None => &self.master,
        }
    }

    /// Master first, then each replica
    pub fn get_all_conns(&self) -> Vec<&PgPool> {
        std::iter::once(&self.master)
            .chain(self.replicas.iter())
            .collect()
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    fn next_replica_index(&self) -> Option<usize> {
        if self.replicas.is_empty() {
            return None;
        }

        Some(self.next_replica.fetch_add(1, Ordering::Relaxed) % self.replicas.len())
    }
}

/// PostgreSQL backed [`Store`]
///
/// # Example
/// ```no_run
/// use platform_store::config::SqlSettings;
/// use platform_store::domain::repositories::Store;
/// use platform_store::infrastructure::SqlStore;
///
/// # async fn run() -> Result<(), platform_store::domain::errors::AppError> {
/// let store = SqlStore::new(&SqlSettings::from_env().unwrap()).await?;
/// let _team = store.team().get("y".repeat(26)).await?;
/// # Ok(())
/// # }
/// ```
pub struct SqlStore {
    conns: Arc<SqlConnections>,
    team: SqlTeamStore,
}

impl SqlStore {
    /// Connects every pool, creates missing tables and runs schema upkeep
    pub async fn new(settings: &SqlSettings) -> StoreResult<Self> {
        tracing::info!(
            replicas = settings.data_source_replicas.len(),
            max_connections = settings.max_connections,
            "Connecting to database..."
        );

        let master = connect_pool(&settings.data_source, settings).await?;

        let mut replicas = Vec::with_capacity(settings.data_source_replicas.len());
        for url in &settings.data_source_replicas {
            replicas.push(connect_pool(url, settings).await?);
        }

        let store = Self::from_pools(master, replicas);
        store.create_tables_if_not_exists().await?;
        store.team.upgrade_schema_if_needed().await?;
        store.team.create_indexes_if_not_exists().await?;

        tracing::info!("Database connected successfully");

        Ok(store)
    }

    /// Wraps already connected pools without touching the schema
    pub fn from_pools(master: PgPool, replicas: Vec<PgPool>) -> Self {
        let conns = Arc::new(SqlConnections::new(master, replicas));
        let team = SqlTeamStore::new(Arc::clone(&conns));

        Self { conns, team }
    }

    pub fn get_master(&self) -> &PgPool {
        self.conns.get_master()
    }

    pub fn get_replica(&self) -> &PgPool {
        self.conns.get_replica()
    }

    pub fn get_all_conns(&self) -> Vec<&PgPool> {
        self.conns.get_all_conns()
    }

    /// Returns the concrete team store
    pub fn sql_team(&self) -> &SqlTeamStore {
        &self.team
    }

    /// Creates every table owned by the stores when it does not exist yet
    pub async fn create_tables_if_not_exists(&self) -> StoreResult<()> {
        for statement in schema::CREATE_TABLES {
            sqlx::query(statement)
                .execute(self.get_master())
                .await
                .map_err(|e| {
                    AppError::internal(
                        "SqlStore.create_tables_if_not_exists",
                        "We couldn't create the database tables",
                        e.to_string(),
                    )
                })?;
        }

        Ok(())
    }
}

#[async_trait]
impl Store for SqlStore {
    fn team(&self) -> &dyn TeamStore {
        &self.team
    }

    async fn close(&self) {
        tracing::info!("Closing database connections");
        for pool in self.get_all_conns() {
            pool.close().await;
        }
    }
}

async fn connect_pool(url: &str, settings: &SqlSettings) -> StoreResult<PgPool> {
    let mut options = PgConnectOptions::from_str(url).map_err(|e| {
        AppError::internal(
            "SqlStore.connect",
            "The database connection URL is invalid",
            e.to_string(),
        )
    })?;

    // sqlx logs statements by default
    if !settings.trace {
        options = options.disable_statement_logging();
    }

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| {
            AppError::internal(
                "SqlStore.connect",
                "We couldn't connect to the database",
                e.to_string(),
            )
        })
}
