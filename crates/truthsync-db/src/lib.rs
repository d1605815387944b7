//! # truthsync-db
//!
//! PostgreSQL database layer for truthsync.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for articles and verifications
//! - Embedded schema migrations
//!
//! ## Example
//!
//! ```rust,ignore
//! use truthsync_db::Database;
//! use truthsync_core::{ArticleRepository, NewArticle};
//!
//! let db = Database::connect("postgres://localhost/truthsync").await?;
//! db.migrate().await?;
//!
//! let id = db.articles.insert(NewArticle {
//!     job_id: "req_01".to_string(),
//!     content: "Breaking story.".to_string(),
//!     image: None,
//!     submessage: String::new(),
//!     location: String::new(),
//!     orientation: String::new(),
//! }).await?;
//! ```

pub mod articles;
pub mod pool;
pub mod verifications;

// Re-export core types
pub use truthsync_core::*;

pub use articles::{derive_title, PgArticleRepository};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use verifications::PgVerificationRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Article repository.
    pub articles: PgArticleRepository,
    /// Verification repository.
    pub verifications: PgVerificationRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            articles: PgArticleRepository::new(pool.clone()),
            verifications: PgVerificationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
