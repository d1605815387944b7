//! Generation pipeline: validation, normalization, inference, chunk
//! delivery, and persistence for one job.
//!
//! One pipeline execution owns one job end-to-end. The synchronous and
//! streaming endpoints share the same execution path; the streaming
//! endpoint additionally receives push events through a channel. A
//! disconnected consumer turns event sends into no-ops — generation and
//! persistence still run to completion and the registry stays
//! authoritative.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::{error, info, warn};

use truthsync_core::{
    defaults, extract_location, extract_orientation, ArticleRepository, Error, GenerationOutcome,
    JobState, NewArticle, Result,
};
use truthsync_inference::{ArticlePrompt, VisionBackend};

use crate::chunker::reconcile;
use crate::normalize::{normalize, NormalizedImage};
use crate::registry::JobRegistry;

/// An uploaded image payload as received by the HTTP layer.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

/// One push event on the streaming channel, serialized as a single JSON
/// object per SSE data line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    /// Lifecycle signal: `started` on acceptance, `processing` milestones.
    Status {
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        job_id: String,
    },
    /// One resolved text chunk.
    Chunk { text: String, job_id: String },
    /// Terminal success event. Exactly one terminal event per job.
    Completed {
        status: String,
        job_id: String,
        saved_to_db: bool,
    },
    /// Terminal error event.
    Error { error: String, job_id: String },
}

impl StreamEvent {
    pub fn started(job_id: &str) -> Self {
        StreamEvent::Status {
            status: "started".to_string(),
            message: Some("Model analysis started".to_string()),
            job_id: job_id.to_string(),
        }
    }

    pub fn processing(job_id: &str, message: &str) -> Self {
        StreamEvent::Status {
            status: "processing".to_string(),
            message: Some(message.to_string()),
            job_id: job_id.to_string(),
        }
    }

    pub fn chunk(job_id: &str, text: impl Into<String>) -> Self {
        StreamEvent::Chunk {
            text: text.into(),
            job_id: job_id.to_string(),
        }
    }

    pub fn completed(job_id: &str, saved_to_db: bool) -> Self {
        StreamEvent::Completed {
            status: "completed".to_string(),
            job_id: job_id.to_string(),
            saved_to_db,
        }
    }

    pub fn error(job_id: &str, error: impl Into<String>) -> Self {
        StreamEvent::Error {
            error: error.into(),
            job_id: job_id.to_string(),
        }
    }
}

/// Pacing delays between push events.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Pause after the `started` event.
    pub started: Duration,
    /// Pause between processing preamble events.
    pub preamble: Duration,
    /// Pause between natively streamed fragments.
    pub native_chunk: Duration,
    /// Pause between synthesized fallback chunks.
    pub fallback_chunk: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            started: Duration::from_millis(defaults::STARTED_DELAY_MS),
            preamble: Duration::from_millis(defaults::PREAMBLE_DELAY_MS),
            native_chunk: Duration::from_millis(defaults::NATIVE_CHUNK_DELAY_MS),
            fallback_chunk: Duration::from_millis(defaults::FALLBACK_CHUNK_DELAY_MS),
        }
    }
}

impl PacingConfig {
    /// Zero delays, for tests.
    pub fn immediate() -> Self {
        Self {
            started: Duration::ZERO,
            preamble: Duration::ZERO,
            native_chunk: Duration::ZERO,
            fallback_chunk: Duration::ZERO,
        }
    }
}

/// Orchestrates the full lifecycle of one generation job.
pub struct GenerationPipeline {
    registry: JobRegistry,
    backend: Arc<dyn VisionBackend>,
    articles: Arc<dyn ArticleRepository>,
    /// The model is a shared, effectively single-owner resource; concurrent
    /// jobs queue on this gate for the duration of their generation call.
    model_gate: Arc<Mutex<()>>,
    pacing: PacingConfig,
}

impl GenerationPipeline {
    pub fn new(
        registry: JobRegistry,
        backend: Arc<dyn VisionBackend>,
        articles: Arc<dyn ArticleRepository>,
    ) -> Self {
        Self {
            registry,
            backend,
            articles,
            model_gate: Arc::new(Mutex::new(())),
            pacing: PacingConfig::default(),
        }
    }

    /// Override pacing delays.
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// The registry this pipeline writes to.
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Run one job end-to-end.
    ///
    /// With an event sink, push events are emitted per the streaming
    /// protocol; without one the same lifecycle runs silently and only the
    /// returned outcome matters. Exactly one terminal event is emitted:
    /// either `completed` or `error`, never both.
    pub async fn execute(
        &self,
        job_id: &str,
        upload: UploadedImage,
        submessage: &str,
        events: Option<mpsc::UnboundedSender<StreamEvent>>,
    ) -> Result<GenerationOutcome> {
        let start = Instant::now();
        self.registry.create(job_id)?;

        emit(&events, StreamEvent::started(job_id));
        if events.is_some() {
            sleep(self.pacing.started).await;
        }

        match self.run(job_id, upload, submessage, &events).await {
            Ok(outcome) => {
                emit(&events, StreamEvent::completed(job_id, outcome.saved_to_db));
                info!(
                    subsystem = "jobs",
                    component = "pipeline",
                    op = "execute",
                    job_id,
                    saved_to_db = outcome.saved_to_db,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Generation job completed"
                );
                Ok(outcome)
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(fail_err) = self.registry.fail(job_id, message.as_str()) {
                    error!(
                        subsystem = "jobs",
                        component = "pipeline",
                        job_id,
                        error = %fail_err,
                        "Failed to mark job as failed"
                    );
                }
                emit(&events, StreamEvent::error(job_id, message.as_str()));
                warn!(
                    subsystem = "jobs",
                    component = "pipeline",
                    op = "execute",
                    job_id,
                    error = %message,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Generation job failed"
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        job_id: &str,
        upload: UploadedImage,
        submessage: &str,
        events: &Option<mpsc::UnboundedSender<StreamEvent>>,
    ) -> Result<GenerationOutcome> {
        // ── Validate ────────────────────────────────────────────────────
        self.registry
            .transition(job_id, JobState::Validating, 5.0, "Validating upload")?;

        let content_type = upload.content_type.as_deref().unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(Error::UnsupportedMediaType(content_type.to_string()));
        }
        if upload.bytes.len() > defaults::MAX_UPLOAD_BYTES {
            return Err(Error::ImageTooLarge(upload.bytes.len()));
        }

        emit(events, StreamEvent::processing(job_id, "Input validated"));

        // ── Normalize ───────────────────────────────────────────────────
        self.registry
            .transition(job_id, JobState::Normalizing, 10.0, "Processing image")?;

        let raw = upload.bytes;
        let normalized: NormalizedImage = tokio::task::spawn_blocking(move || normalize(&raw))
            .await
            .map_err(|e| Error::Internal(format!("Normalizer task panicked: {}", e)))??;

        emit(events, StreamEvent::processing(job_id, "Image normalized"));
        if events.is_some() {
            sleep(self.pacing.preamble).await;
        }

        // ── Generate ────────────────────────────────────────────────────
        let prompt = ArticlePrompt::build(submessage);
        self.registry
            .transition(job_id, JobState::Generating, 30.0, "Invoking model")?;
        emit(
            events,
            StreamEvent::processing(job_id, "Generating article"),
        );
        if events.is_some() {
            sleep(self.pacing.preamble).await;
        }

        let fragment_log: Arc<StdMutex<Vec<String>>> = Arc::new(StdMutex::new(Vec::new()));
        let final_text = {
            let registry = self.registry.clone();
            let log = fragment_log.clone();
            let fragment_job_id = job_id.to_string();
            let on_fragment = move |fragment: &str| {
                // Partial-text append keeps the poll view live; the log
                // feeds the reconciler after generation returns.
                if let Err(e) = registry.append_fragment(&fragment_job_id, fragment) {
                    warn!(
                        subsystem = "jobs",
                        component = "pipeline",
                        job_id = %fragment_job_id,
                        error = %e,
                        "Dropped fragment append"
                    );
                }
                if let Ok(mut log) = log.lock() {
                    log.push(fragment.to_string());
                }
            };

            let _gate = self.model_gate.lock().await;
            self.registry
                .update_progress(job_id, 50.0, "Model analyzing image")?;
            self.backend
                .generate(&normalized.bytes, &prompt, &on_fragment)
                .await?
        };

        // ── Deliver chunks ──────────────────────────────────────────────
        let fragments = fragment_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default();
        let native = !fragments.is_empty();
        let chunks = reconcile(&final_text, &fragments);

        if let Some(tx) = events {
            let delay = if native {
                self.pacing.native_chunk
            } else {
                self.pacing.fallback_chunk
            };
            for chunk in &chunks {
                let _ = tx.send(StreamEvent::chunk(job_id, chunk.clone()));
                sleep(delay).await;
            }
        }

        info!(
            subsystem = "jobs",
            component = "pipeline",
            op = "reconcile",
            job_id,
            fragment_count = fragments.len(),
            chunk_count = chunks.len(),
            response_len = final_text.len(),
            "Chunk delivery resolved"
        );

        // ── Persist ─────────────────────────────────────────────────────
        self.registry
            .transition(job_id, JobState::Finalizing, 90.0, "Saving article")?;

        let article = NewArticle {
            job_id: job_id.to_string(),
            content: final_text.clone(),
            image: Some(normalized.bytes),
            submessage: submessage.to_string(),
            location: extract_location(submessage),
            orientation: extract_orientation(submessage),
        };

        // Persistence failure never fails the job; the caller still gets
        // the generated article with saved_to_db=false.
        let saved_to_db = match self.articles.insert(article).await {
            Ok(article_id) => {
                info!(
                    subsystem = "jobs",
                    component = "pipeline",
                    op = "persist",
                    job_id,
                    article_id,
                    "Article persisted"
                );
                true
            }
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "pipeline",
                    op = "persist",
                    job_id,
                    error = %e,
                    "Article persistence failed"
                );
                false
            }
        };

        self.registry.transition(
            job_id,
            JobState::Completed {
                article: final_text.clone(),
                saved_to_db,
            },
            100.0,
            "Analysis complete",
        )?;

        Ok(GenerationOutcome {
            article: final_text,
            saved_to_db,
        })
    }
}

fn emit(events: &Option<mpsc::UnboundedSender<StreamEvent>>, event: StreamEvent) {
    if let Some(tx) = events {
        // A closed channel means the consumer disconnected; the job keeps
        // running regardless.
        let _ = tx.send(event);
    }
}
