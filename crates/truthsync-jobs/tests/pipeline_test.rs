//! End-to-end pipeline tests against the scripted mock backend.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use truthsync_core::{
    Article, ArticleRepository, Error, JobState, NewArticle, Result,
};
use truthsync_inference::MockVisionBackend;
use truthsync_jobs::{GenerationPipeline, JobRegistry, PacingConfig, StreamEvent, UploadedImage};

/// In-memory article store; optionally fails every insert.
#[derive(Default)]
struct MemoryArticles {
    rows: Mutex<Vec<NewArticle>>,
    fail_inserts: bool,
}

impl MemoryArticles {
    fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_inserts: true,
        }
    }

    fn stored(&self) -> Vec<NewArticle> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleRepository for MemoryArticles {
    async fn insert(&self, article: NewArticle) -> Result<i64> {
        if self.fail_inserts {
            return Err(Error::Internal("store unavailable".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        if let Some(pos) = rows.iter().position(|r| r.job_id == article.job_id) {
            return Ok(pos as i64 + 1);
        }
        rows.push(article);
        Ok(rows.len() as i64)
    }

    async fn fetch(&self, id: i64) -> Result<Article> {
        Err(Error::ArticleNotFound(id))
    }

    async fn list(&self, _limit: i64, _offset: i64) -> Result<Vec<Article>> {
        Ok(Vec::new())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        Err(Error::ArticleNotFound(id))
    }
}

fn png_upload() -> UploadedImage {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(64, 96));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    UploadedImage {
        bytes,
        content_type: Some("image/png".to_string()),
        filename: Some("capture.png".to_string()),
    }
}

fn pipeline_with(
    backend: MockVisionBackend,
    articles: Arc<MemoryArticles>,
) -> (GenerationPipeline, JobRegistry) {
    let registry = JobRegistry::new();
    let pipeline = GenerationPipeline::new(registry.clone(), Arc::new(backend), articles)
        .with_pacing(PacingConfig::immediate());
    (pipeline, registry)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn terminal_count(events: &[StreamEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, StreamEvent::Completed { .. } | StreamEvent::Error { .. }))
        .count()
}

#[tokio::test]
async fn native_streaming_delivers_logged_fragments() {
    let fragments = vec!["Breaking: ".to_string(), "a fire ".to_string(), "downtown.".to_string()];
    let backend = MockVisionBackend::new().with_fragments(fragments.clone());
    let articles = Arc::new(MemoryArticles::default());
    let (pipeline, registry) = pipeline_with(backend, articles.clone());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = pipeline
        .execute("stream_1", png_upload(), "", Some(tx))
        .await
        .unwrap();

    assert_eq!(outcome.article, "Breaking: a fire downtown.");
    assert!(outcome.saved_to_db);

    let events = drain(&mut rx);
    assert!(matches!(
        &events[0],
        StreamEvent::Status { status, .. } if status == "started"
    ));

    let chunks: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Chunk { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(chunks, fragments.iter().map(String::as_str).collect::<Vec<_>>());

    assert_eq!(terminal_count(&events), 1);
    assert!(matches!(
        events.last().unwrap(),
        StreamEvent::Completed { saved_to_db: true, .. }
    ));

    // Poll view and push view agree on final content.
    let job = registry.get("stream_1").unwrap();
    match job.state {
        JobState::Completed { article, saved_to_db } => {
            assert_eq!(article, "Breaking: a fire downtown.");
            assert!(saved_to_db);
        }
        other => panic!("expected Completed, got {:?}", other),
    }
    assert_eq!(job.partial_text, "Breaking: a fire downtown.");
    assert_eq!(job.progress, 100.0);
}

#[tokio::test]
async fn fallback_chunking_when_no_fragments_arrive() {
    let backend = MockVisionBackend::new()
        .with_response("First sentence. Second sentence! A question? Trailing words");
    let articles = Arc::new(MemoryArticles::default());
    let (pipeline, _registry) = pipeline_with(backend, articles);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = pipeline
        .execute("stream_2", png_upload(), "", Some(tx))
        .await
        .unwrap();

    let events = drain(&mut rx);
    let chunks: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Chunk { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(
        chunks,
        vec![
            "First sentence. ",
            "Second sentence! ",
            "A question? ",
            "Trailing words "
        ]
    );

    // The chunked stream reconstructs the final text losslessly.
    let rebuilt = chunks
        .iter()
        .map(|c| c.trim())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(rebuilt, outcome.article);
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn non_image_content_type_is_rejected_before_generation() {
    let backend = MockVisionBackend::new();
    let articles = Arc::new(MemoryArticles::default());
    let (pipeline, registry) = pipeline_with(backend.clone(), articles.clone());

    let upload = UploadedImage {
        bytes: b"%PDF-1.4".to_vec(),
        content_type: Some("application/pdf".to_string()),
        filename: None,
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let err = pipeline
        .execute("stream_3", upload, "", Some(tx))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedMediaType(_)));

    // Model never invoked, nothing persisted.
    assert_eq!(backend.call_count(), 0);
    assert!(articles.stored().is_empty());

    let events = drain(&mut rx);
    assert_eq!(terminal_count(&events), 1);
    assert!(matches!(events.last().unwrap(), StreamEvent::Error { .. }));

    let job = registry.get("stream_3").unwrap();
    assert!(matches!(job.state, JobState::Failed { .. }));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let backend = MockVisionBackend::new();
    let articles = Arc::new(MemoryArticles::default());
    let (pipeline, _registry) = pipeline_with(backend, articles);

    let upload = UploadedImage {
        bytes: vec![0u8; truthsync_core::defaults::MAX_UPLOAD_BYTES + 1],
        content_type: Some("image/jpeg".to_string()),
        filename: None,
    };

    let err = pipeline
        .execute("req_big", upload, "", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ImageTooLarge(_)));
}

#[tokio::test]
async fn undecodable_image_fails_during_normalization() {
    let backend = MockVisionBackend::new();
    let articles = Arc::new(MemoryArticles::default());
    let (pipeline, registry) = pipeline_with(backend.clone(), articles);

    let upload = UploadedImage {
        bytes: b"not really a png".to_vec(),
        content_type: Some("image/png".to_string()),
        filename: None,
    };

    let err = pipeline
        .execute("req_bad", upload, "", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ImageUndecodable(_)));
    assert_eq!(backend.call_count(), 0);

    let job = registry.get("req_bad").unwrap();
    assert!(matches!(job.state, JobState::Failed { .. }));
}

#[tokio::test]
async fn generation_failure_reaches_failed_with_message_preserved() {
    let backend = MockVisionBackend::new().failing_with("model crashed mid-stream");
    let articles = Arc::new(MemoryArticles::default());
    let (pipeline, registry) = pipeline_with(backend, articles.clone());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let err = pipeline
        .execute("stream_4", png_upload(), "", Some(tx))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Inference(_)));

    // No partial article persisted.
    assert!(articles.stored().is_empty());

    let events = drain(&mut rx);
    assert_eq!(terminal_count(&events), 1);
    match events.last().unwrap() {
        StreamEvent::Error { error, .. } => assert!(error.contains("model crashed mid-stream")),
        other => panic!("expected error event, got {:?}", other),
    }

    match registry.get("stream_4").unwrap().state {
        JobState::Failed { error } => assert!(error.contains("model crashed mid-stream")),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn persistence_failure_still_returns_article() {
    let backend = MockVisionBackend::new().with_response("Generated despite outage.");
    let articles = Arc::new(MemoryArticles::failing());
    let (pipeline, registry) = pipeline_with(backend, articles);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = pipeline
        .execute("stream_5", png_upload(), "", Some(tx))
        .await
        .unwrap();

    assert_eq!(outcome.article, "Generated despite outage.");
    assert!(!outcome.saved_to_db);

    let events = drain(&mut rx);
    assert!(matches!(
        events.last().unwrap(),
        StreamEvent::Completed { saved_to_db: false, .. }
    ));

    match registry.get("stream_5").unwrap().state {
        JobState::Completed { saved_to_db, .. } => assert!(!saved_to_db),
        other => panic!("expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn synchronous_path_runs_without_event_sink() {
    let backend = MockVisionBackend::new().with_response("Quiet completion.");
    let articles = Arc::new(MemoryArticles::default());
    let (pipeline, registry) = pipeline_with(backend, articles.clone());

    let outcome = pipeline
        .execute("req_sync", png_upload(), "", None)
        .await
        .unwrap();

    assert_eq!(outcome.article, "Quiet completion.");
    assert!(outcome.saved_to_db);
    assert!(matches!(
        registry.get("req_sync").unwrap().state,
        JobState::Completed { .. }
    ));
    assert_eq!(articles.stored().len(), 1);
}

#[tokio::test]
async fn consumer_disconnect_does_not_abort_the_job() {
    let backend = MockVisionBackend::new().with_response("Still persisted.");
    let articles = Arc::new(MemoryArticles::default());
    let (pipeline, registry) = pipeline_with(backend, articles.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx); // consumer gone before the job even starts

    let outcome = pipeline
        .execute("stream_6", png_upload(), "", Some(tx))
        .await
        .unwrap();

    assert!(outcome.saved_to_db);
    assert_eq!(articles.stored().len(), 1);
    assert!(matches!(
        registry.get("stream_6").unwrap().state,
        JobState::Completed { .. }
    ));
}

#[tokio::test]
async fn duplicate_job_id_is_a_contract_violation() {
    let backend = MockVisionBackend::new();
    let articles = Arc::new(MemoryArticles::default());
    let (pipeline, _registry) = pipeline_with(backend, articles);

    pipeline
        .execute("req_dup", png_upload(), "", None)
        .await
        .unwrap();
    let err = pipeline
        .execute("req_dup", png_upload(), "", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Job(_)));
}

#[tokio::test]
async fn submessage_metadata_is_scraped_into_the_article() {
    let backend = MockVisionBackend::new().with_response("Scene report.");
    let articles = Arc::new(MemoryArticles::default());
    let (pipeline, _registry) = pipeline_with(backend.clone(), articles.clone());

    let submessage = "street scene, 촬영 위치: 37.55,126.99 (Jung-gu, Seoul), 촬영 방향: portrait, end";
    pipeline
        .execute("req_meta", png_upload(), submessage, None)
        .await
        .unwrap();

    let stored = articles.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].location, "37.55,126.99 (Jung-gu, Seoul");
    assert_eq!(stored[0].orientation, "portrait");
    assert_eq!(stored[0].submessage, submessage);
    assert!(stored[0].image.is_some());

    // Portrait marker also reached the prompt.
    assert!(backend.prompts()[0].system.contains("portrait"));
}
