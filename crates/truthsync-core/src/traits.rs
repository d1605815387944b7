//! Repository traits implemented by the database layer.
//!
//! The pipeline depends on these traits rather than concrete Postgres
//! types so tests can substitute in-memory fakes.

use async_trait::async_trait;

use crate::models::{Article, NewArticle, NewVerification, Verification};
use crate::Result;

/// Persistence gateway for generated articles.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert an article, idempotent by `job_id`: a retried insert with the
    /// same job never creates a duplicate row. Returns the row id.
    async fn insert(&self, article: NewArticle) -> Result<i64>;

    /// Fetch one article by id.
    async fn fetch(&self, id: i64) -> Result<Article>;

    /// List articles newest first.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Article>>;

    /// Delete an article; its verifications cascade.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// Persistence gateway for community verifications.
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Record a verification and, in the same transaction, recompute the
    /// parent article's aggregate score and count.
    async fn record(&self, verification: NewVerification) -> Result<()>;

    /// List an article's verifications newest first.
    async fn list_for_article(&self, article_id: i64) -> Result<Vec<Verification>>;
}
