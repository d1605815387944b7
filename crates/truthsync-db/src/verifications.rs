//! Verification repository implementation.
//!
//! A verification is immutable once created; the parent article's
//! `verification_score` and `verification_count` are derived aggregates,
//! recomputed inside the same transaction as every insert.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use truthsync_core::{
    Error, NewVerification, Result, Verdict, Verification, VerificationRepository,
};

/// PostgreSQL implementation of VerificationRepository.
pub struct PgVerificationRepository {
    pool: Pool<Postgres>,
}

impl PgVerificationRepository {
    /// Create a new PgVerificationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_verification(row: PgRow) -> Verification {
    let verdict: String = row.get("verdict");
    Verification {
        id: row.get("id"),
        article_id: row.get("article_id"),
        reviewer_id: row.get("reviewer_id"),
        reviewer_location: row.get("reviewer_location"),
        // The CHECK constraint guarantees a parsable value.
        verdict: Verdict::parse(&verdict).unwrap_or(Verdict::Unsure),
        confidence: row.get("confidence"),
        comment: row.get("comment"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl VerificationRepository for PgVerificationRepository {
    async fn record(&self, verification: NewVerification) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let exists = sqlx::query("SELECT id FROM articles WHERE id = $1")
            .bind(verification.article_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if exists.is_none() {
            return Err(Error::ArticleNotFound(verification.article_id));
        }

        sqlx::query(
            r#"
            INSERT INTO verifications
                (article_id, reviewer_id, reviewer_location, verdict, confidence, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(verification.article_id)
        .bind(&verification.reviewer_id)
        .bind(&verification.reviewer_location)
        .bind(verification.verdict.as_str())
        .bind(verification.confidence)
        .bind(&verification.comment)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // Both aggregates are derived from the verification rows; neither is
        // ever incremented independently.
        sqlx::query(
            r#"
            UPDATE articles SET
                verification_count = sub.cnt,
                verification_score = sub.score,
                updated_at = now()
            FROM (
                SELECT
                    COUNT(*)::int AS cnt,
                    AVG(CASE verdict
                        WHEN 'truth' THEN 1.0
                        WHEN 'fake' THEN 0.0
                        ELSE 0.5
                    END)::double precision AS score
                FROM verifications
                WHERE article_id = $1
            ) AS sub
            WHERE articles.id = $1
            "#,
        )
        .bind(verification.article_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        tracing::info!(
            subsystem = "db",
            component = "verifications",
            op = "record_verification",
            article_id = verification.article_id,
            verdict = verification.verdict.as_str(),
            "Verification recorded"
        );
        Ok(())
    }

    async fn list_for_article(&self, article_id: i64) -> Result<Vec<Verification>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM verifications
            WHERE article_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_verification).collect())
    }
}
