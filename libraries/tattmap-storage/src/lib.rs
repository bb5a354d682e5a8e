//! Tattmap Storage
//!
//! `SQLite` persistence for users, artist profiles and likes, plus the two
//! geo search backends used by the search core.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: each feature owns its own queries
//! - **Fixed-point coordinates**: degrees are stored as micro-degree integers
//! - **Spatial index**: an R*Tree table mirrors artist points and is kept in
//!   sync inside the same transaction as the artist row
//!
//! # Example
//!
//! ```rust,no_run
//! use tattmap_storage::{create_pool, run_migrations, Database};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://tattmap.db").await?;
//! run_migrations(&pool).await?;
//!
//! let db = Database::new(pool);
//! let top = tattmap_storage::artists::top_by_likes(db.pool(), 10).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod row;

// Vertical slices
pub mod artists;
pub mod likes;
pub mod search;
pub mod users;

pub use error::StorageError;
pub use likes::SqliteLikeCounter;
pub use search::{PredicateScan, SpatialIndexScan};

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tattmap_core::{ArtistSearch, GeoSearchBackend};

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://tattmap.db>`)
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(url = %database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    tracing::info!("SQLite pool ready");

    Ok(pool)
}

/// Handle to the database shared by the application
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect, migrate and wrap in one step
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Search backend; the R*Tree variant when `spatial_index` is set
    pub fn search_backend(&self, spatial_index: bool) -> Arc<dyn GeoSearchBackend> {
        if spatial_index {
            Arc::new(SpatialIndexScan::new(self.pool.clone()))
        } else {
            Arc::new(PredicateScan::new(self.pool.clone()))
        }
    }

    /// Search orchestrator wired to this database
    pub fn artist_search(&self, spatial_index: bool, max_limit: i64) -> ArtistSearch {
        ArtistSearch::new(
            self.search_backend(spatial_index),
            Arc::new(SqliteLikeCounter::new(self.pool.clone())),
        )
        .with_max_limit(max_limit)
    }

    /// Liveness check
    ///
    /// # Errors
    ///
    /// Returns an error if the database does not answer
    pub async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
