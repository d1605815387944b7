//! Domain models for jobs, articles, and verifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate an opaque job identifier with the given prefix.
///
/// UUIDv7 embeds a Unix timestamp, so ids sort chronologically — useful
/// for log correlation when scanning registry dumps.
pub fn new_job_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::now_v7().simple())
}

/// Lifecycle state of a generation job.
///
/// States move strictly forward; `Completed` and `Failed` are terminal and
/// carry the variant-specific payload the status endpoint exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    Accepted,
    Validating,
    Normalizing,
    Generating,
    Finalizing,
    Completed { article: String, saved_to_db: bool },
    Failed { error: String },
}

impl JobState {
    /// Ordinal used to enforce forward-only transitions.
    pub fn rank(&self) -> u8 {
        match self {
            JobState::Accepted => 0,
            JobState::Validating => 1,
            JobState::Normalizing => 2,
            JobState::Generating => 3,
            JobState::Finalizing => 4,
            JobState::Completed { .. } => 5,
            JobState::Failed { .. } => 6,
        }
    }

    /// Whether no further transitions are permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed { .. } | JobState::Failed { .. })
    }

    /// Stable lowercase name of the state (matches the wire `status` tag).
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Accepted => "accepted",
            JobState::Validating => "validating",
            JobState::Normalizing => "normalizing",
            JobState::Generating => "generating",
            JobState::Finalizing => "finalizing",
            JobState::Completed { .. } => "completed",
            JobState::Failed { .. } => "failed",
        }
    }
}

/// One generation request's end-to-end lifecycle record.
///
/// Mutated exclusively by the pipeline executing the job; everyone else
/// only sees cloned snapshots from the registry.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// Opaque external handle, also the natural key for persistence.
    pub id: String,
    /// Current lifecycle state with variant-specific payload.
    #[serde(flatten)]
    pub state: JobState,
    /// Monotonically non-decreasing estimate in [0, 100]. Informational only.
    pub progress: f64,
    /// Human-readable description of the current phase.
    pub message: String,
    /// Text observed so far, append-only until terminal.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub partial_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a freshly accepted job.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state: JobState::Accepted,
            progress: 0.0,
            message: "Analysis accepted".to_string(),
            partial_text: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of a finished generation, as returned to the synchronous caller.
///
/// Generation success and persistence success are independent: a storage
/// outage never hides a successful generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub article: String,
    pub saved_to_db: bool,
}

/// A reviewer's classification of an article's veracity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Truth,
    Fake,
    Unsure,
}

impl Verdict {
    /// Contribution of this verdict to the article's aggregate score.
    pub fn weight(self) -> f64 {
        match self {
            Verdict::Truth => 1.0,
            Verdict::Fake => 0.0,
            Verdict::Unsure => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Truth => "truth",
            Verdict::Fake => "fake",
            Verdict::Unsure => "unsure",
        }
    }

    /// Parse the wire value; anything else is an invalid verdict.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "truth" => Some(Verdict::Truth),
            "fake" => Some(Verdict::Fake),
            "unsure" => Some(Verdict::Unsure),
            _ => None,
        }
    }
}

/// A persisted, user-durable article row.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: i64,
    pub job_id: String,
    pub title: Option<String>,
    pub content: String,
    /// Normalized JPEG bytes; serialized by the API layer as base64.
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
    pub submessage: String,
    pub location: String,
    pub orientation: String,
    pub status: String,
    /// Running mean of verdict weights over all verifications. Derived.
    pub verification_score: f64,
    /// Total verifications recorded. Derived.
    pub verification_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for inserting a new article, keyed by its originating job.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub job_id: String,
    pub content: String,
    pub image: Option<Vec<u8>>,
    pub submessage: String,
    pub location: String,
    pub orientation: String,
}

/// One reviewer's immutable verification of an article.
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub id: i64,
    pub article_id: i64,
    pub reviewer_id: String,
    pub reviewer_location: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for recording a new verification.
#[derive(Debug, Clone)]
pub struct NewVerification {
    pub article_id: i64,
    pub reviewer_id: String,
    pub reviewer_location: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_id_prefix() {
        let id = new_job_id("req");
        assert!(id.starts_with("req_"));
        assert!(id.len() > 8);
    }

    #[test]
    fn test_new_job_id_unique() {
        assert_ne!(new_job_id("stream"), new_job_id("stream"));
    }

    #[test]
    fn test_state_ranks_strictly_increase() {
        let states = [
            JobState::Accepted,
            JobState::Validating,
            JobState::Normalizing,
            JobState::Generating,
            JobState::Finalizing,
            JobState::Completed {
                article: String::new(),
                saved_to_db: true,
            },
        ];
        for pair in states.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Completed {
            article: "a".into(),
            saved_to_db: false
        }
        .is_terminal());
        assert!(JobState::Failed {
            error: "boom".into()
        }
        .is_terminal());
        assert!(!JobState::Generating.is_terminal());
        assert!(!JobState::Accepted.is_terminal());
    }

    #[test]
    fn test_job_snapshot_serialization() {
        let mut job = Job::new("req_1");
        job.state = JobState::Generating;
        job.progress = 57.5;
        job.partial_text = "Breaking".to_string();

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "generating");
        assert_eq!(json["progress"], 57.5);
        assert_eq!(json["partial_text"], "Breaking");
    }

    #[test]
    fn test_completed_snapshot_carries_payload() {
        let mut job = Job::new("req_2");
        job.state = JobState::Completed {
            article: "Full story.".to_string(),
            saved_to_db: true,
        };
        job.progress = 100.0;

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["article"], "Full story.");
        assert_eq!(json["saved_to_db"], true);
        // partial_text is empty and omitted from the snapshot
        assert!(json.get("partial_text").is_none());
    }

    #[test]
    fn test_verdict_weights() {
        assert_eq!(Verdict::Truth.weight(), 1.0);
        assert_eq!(Verdict::Fake.weight(), 0.0);
        assert_eq!(Verdict::Unsure.weight(), 0.5);
    }

    #[test]
    fn test_verdict_parse_round_trip() {
        for v in [Verdict::Truth, Verdict::Fake, Verdict::Unsure] {
            assert_eq!(Verdict::parse(v.as_str()), Some(v));
        }
        assert_eq!(Verdict::parse("maybe"), None);
        assert_eq!(Verdict::parse("TRUTH"), None);
    }
}
