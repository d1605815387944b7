//! Structured logging field name constants for truthsync.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (fragments, chunks) |

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "registry", "normalizer", "ollama", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "generate", "normalize", "reconcile", "insert_article"
pub const OPERATION: &str = "op";

/// Job identifier being processed.
pub const JOB_ID: &str = "job_id";

/// Article row id being operated on.
pub const ARTICLE_ID: &str = "article_id";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Number of fragments observed from native streaming.
pub const FRAGMENT_COUNT: &str = "fragment_count";

/// Number of chunks delivered to the push consumer.
pub const CHUNK_COUNT: &str = "chunk_count";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
