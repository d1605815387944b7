//! Article repository implementation.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use truthsync_core::{
    defaults, Article, ArticleRepository, Error, NewArticle, Result,
};

/// PostgreSQL implementation of ArticleRepository.
pub struct PgArticleRepository {
    pool: Pool<Postgres>,
}

impl PgArticleRepository {
    /// Create a new PgArticleRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Derive a title from article content: the first `.`-terminated sentence,
/// truncated to [`defaults::TITLE_MAX_CHARS`] characters with an ellipsis.
pub fn derive_title(content: &str) -> String {
    let first = content.split('.').next().unwrap_or(content).trim();
    if first.chars().count() > defaults::TITLE_MAX_CHARS {
        let truncated: String = first.chars().take(defaults::TITLE_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        first.to_string()
    }
}

fn map_row_to_article(row: PgRow) -> Article {
    Article {
        id: row.get("id"),
        job_id: row.get("job_id"),
        title: row.get("title"),
        content: row.get("content"),
        image: row.get("image"),
        submessage: row.get("submessage"),
        location: row.get("location"),
        orientation: row.get("orientation"),
        status: row.get("status"),
        verification_score: row.get("verification_score"),
        verification_count: row.get("verification_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ArticleRepository for PgArticleRepository {
    async fn insert(&self, article: NewArticle) -> Result<i64> {
        let title = derive_title(&article.content);

        // ON CONFLICT DO NOTHING keeps the original row on retry; the
        // follow-up SELECT resolves the id either way.
        let inserted = sqlx::query(
            r#"
            INSERT INTO articles (job_id, title, content, image, submessage, location, orientation)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (job_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&article.job_id)
        .bind(&title)
        .bind(&article.content)
        .bind(&article.image)
        .bind(&article.submessage)
        .bind(&article.location)
        .bind(&article.orientation)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let id: i64 = match inserted {
            Some(row) => row.get("id"),
            None => sqlx::query("SELECT id FROM articles WHERE job_id = $1")
                .bind(&article.job_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?
                .get("id"),
        };

        tracing::info!(
            subsystem = "db",
            component = "articles",
            op = "insert_article",
            article_id = id,
            job_id = %article.job_id,
            "Article stored"
        );
        Ok(id)
    }

    async fn fetch(&self, id: i64) -> Result<Article> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(map_row_to_article)
            .ok_or(Error::ArticleNotFound(id))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_article).collect())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        // Verifications cascade via the FK constraint.
        let deleted = sqlx::query("DELETE FROM articles WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        if deleted.is_none() {
            return Err(Error::ArticleNotFound(id));
        }

        tracing::info!(
            subsystem = "db",
            component = "articles",
            op = "delete_article",
            article_id = id,
            "Article deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_short_sentence() {
        assert_eq!(
            derive_title("Fire breaks out downtown. Crews responded."),
            "Fire breaks out downtown"
        );
    }

    #[test]
    fn test_derive_title_no_period() {
        assert_eq!(derive_title("Untitled scene"), "Untitled scene");
    }

    #[test]
    fn test_derive_title_truncates_long_sentence() {
        let long = "a".repeat(150);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), 103);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_derive_title_multibyte_safe() {
        let content = format!("{}. 나머지", "기".repeat(120));
        let title = derive_title(&content);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 103);
    }
}
