//! Article and verification endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use truthsync_core::{
    defaults, Article, ArticleRepository, NewVerification, Verdict, VerificationRepository,
};

use crate::{ApiError, AppState};

/// Serialize an article, encoding the stored image as base64.
fn article_json(article: Article) -> serde_json::Value {
    let image = article
        .image
        .as_ref()
        .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes));

    let mut value = serde_json::to_value(&article).unwrap_or_else(|_| json!({}));
    if let serde_json::Value::Object(map) = &mut value {
        map.insert("image".to_string(), json!(image));
    }
    value
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

/// `GET /articles?limit&offset` — paged list, newest first.
pub(crate) async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(defaults::DEFAULT_LIST_LIMIT)
        .clamp(1, defaults::MAX_LIST_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let articles = state.db.articles.list(limit, offset).await?;
    let total = articles.len();
    let articles: Vec<_> = articles.into_iter().map(article_json).collect();

    Ok(Json(json!({
        "articles": articles,
        "total": total,
        "limit": limit,
        "offset": offset,
    })))
}

/// `GET /articles/:id` — single article.
pub(crate) async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let article = state.db.articles.fetch(id).await?;
    Ok(Json(article_json(article)))
}

/// `DELETE /articles/:id` — delete an article; verifications cascade.
pub(crate) async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.articles.delete(id).await?;
    Ok(Json(json!({ "message": "Article deleted" })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    #[serde(default)]
    reviewer_id: String,
    #[serde(default)]
    reviewer_location: String,
    verdict: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    comment: String,
}

/// `POST /articles/:id/verify` — record a verdict and recompute the
/// article's aggregate score.
pub(crate) async fn verify_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(verdict) = Verdict::parse(&request.verdict) else {
        return Err(ApiError::BadRequest(
            "Verdict must be one of 'truth', 'fake', 'unsure'".to_string(),
        ));
    };

    state
        .db
        .verifications
        .record(NewVerification {
            article_id: id,
            reviewer_id: request.reviewer_id,
            reviewer_location: request.reviewer_location,
            verdict,
            confidence: request.confidence,
            comment: request.comment,
        })
        .await?;

    Ok(Json(json!({ "message": "Verification recorded" })))
}

/// `GET /articles/:id/verifications` — list verifications newest first.
pub(crate) async fn list_verifications(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let verifications = state.db.verifications.list_for_article(id).await?;
    let total = verifications.len();

    Ok(Json(json!({
        "article_id": id,
        "verifications": verifications,
        "total": total,
    })))
}
