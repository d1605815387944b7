//! truthsync-api - HTTP API server for truthsync

mod error;
mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use truthsync_core::defaults;
use truthsync_db::{Database, PgArticleRepository, PoolConfig};
use truthsync_inference::{OllamaVisionBackend, VisionBackend};
use truthsync_jobs::{GenerationPipeline, JobRegistry};

pub(crate) use error::ApiError;

/// Headroom above the image cap for multipart framing and the submessage.
const BODY_LIMIT_BYTES: usize = defaults::MAX_UPLOAD_BYTES + 2 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    db: Database,
    registry: JobRegistry,
    pipeline: Arc<GenerationPipeline>,
    backend: Arc<dyn VisionBackend>,
    model: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "truthsync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var(defaults::ENV_DATABASE_URL)
        .map_err(|_| anyhow::anyhow!("{} must be set", defaults::ENV_DATABASE_URL))?;
    let db = Database::connect_with_config(&database_url, PoolConfig::from_env()).await?;
    db.migrate().await?;
    info!(subsystem = "api", op = "startup", "Database ready");

    let backend: Arc<dyn VisionBackend> = Arc::new(OllamaVisionBackend::from_env());
    let model = backend.model_name().to_string();
    info!(
        subsystem = "api",
        op = "startup",
        model = %model,
        "Vision backend configured"
    );

    let registry = JobRegistry::new();
    let articles = Arc::new(PgArticleRepository::new(db.pool.clone()));
    let pipeline = Arc::new(GenerationPipeline::new(
        registry.clone(),
        backend.clone(),
        articles,
    ));

    let state = AppState {
        db,
        registry,
        pipeline,
        backend,
        model,
    };

    let app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/generate-article", post(handlers::generate::generate_article))
        .route(
            "/generate-article-stream",
            post(handlers::generate::generate_article_stream),
        )
        .route(
            "/analysis-status/:job_id",
            get(handlers::generate::analysis_status),
        )
        .route("/articles", get(handlers::articles::list_articles))
        .route(
            "/articles/:id",
            get(handlers::articles::get_article).delete(handlers::articles::delete_article),
        )
        .route(
            "/articles/:id/verify",
            post(handlers::articles::verify_article),
        )
        .route(
            "/articles/:id/verifications",
            get(handlers::articles::list_verifications),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .with_state(state);

    let bind_addr =
        std::env::var(defaults::ENV_BIND_ADDR).unwrap_or_else(|_| defaults::BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        subsystem = "api",
        op = "startup",
        addr = %bind_addr,
        "TruthSync API listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
