//! Generation endpoints: synchronous, streaming, and status polling.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use serde_json::json;
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};
use tracing::info;

use truthsync_core::new_job_id;
use truthsync_jobs::{StreamEvent, UploadedImage};

use crate::{ApiError, AppState};

struct GenerateInput {
    upload: UploadedImage,
    submessage: String,
}

/// Pull the image payload and optional submessage out of the multipart body.
async fn read_multipart(multipart: &mut Multipart) -> Result<GenerateInput, ApiError> {
    let mut upload: Option<UploadedImage> = None;
    let mut submessage = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart payload: {}", e)))?
    {
        match field.name() {
            Some("image") => {
                let content_type = field.content_type().map(str::to_string);
                let filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
                upload = Some(UploadedImage {
                    bytes: bytes.to_vec(),
                    content_type,
                    filename,
                });
            }
            Some("submessage") => {
                submessage = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read submessage: {}", e)))?;
            }
            _ => {}
        }
    }

    let upload =
        upload.ok_or_else(|| ApiError::BadRequest("Missing multipart field: image".to_string()))?;
    Ok(GenerateInput { upload, submessage })
}

/// `POST /generate-article` — run the full pipeline and return the article
/// once generation finishes.
pub(crate) async fn generate_article(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let input = read_multipart(&mut multipart).await?;
    let job_id = new_job_id("req");

    info!(
        subsystem = "api",
        op = "generate_article",
        job_id = %job_id,
        filename = input.upload.filename.as_deref().unwrap_or("unknown"),
        submessage_len = input.submessage.len(),
        "Analysis request received"
    );

    let outcome = state
        .pipeline
        .execute(&job_id, input.upload, &input.submessage, None)
        .await?;

    Ok(Json(json!({
        "article": outcome.article,
        "job_id": job_id,
        "saved_to_db": outcome.saved_to_db,
    })))
}

/// `POST /generate-article-stream` — server-streamed delivery.
///
/// Each event is one JSON object on an SSE data line, terminated by exactly
/// one `completed` or `error` object. The pipeline task keeps running if
/// the consumer disconnects; the registry stays authoritative.
pub(crate) async fn generate_article_stream(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let input = read_multipart(&mut multipart).await?;
    let job_id = new_job_id("stream");

    info!(
        subsystem = "api",
        op = "generate_article_stream",
        job_id = %job_id,
        "Streamed analysis request received"
    );

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<StreamEvent>();
    let pipeline = state.pipeline.clone();
    let task_job_id = job_id.clone();
    tokio::spawn(async move {
        // Failures are already reflected in the registry and as the
        // stream's terminal error event.
        let _ = pipeline
            .execute(&task_job_id, input.upload, &input.submessage, Some(tx))
            .await;
    });

    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().data(data))
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}

/// `GET /analysis-status/:job_id` — registry snapshot for polling clients.
pub(crate) async fn analysis_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Json<serde_json::Value> {
    match state.registry.get(&job_id) {
        Some(job) => Json(
            serde_json::to_value(&job).unwrap_or_else(|_| json!({ "status": "not_found" })),
        ),
        None => Json(json!({ "status": "not_found" })),
    }
}
