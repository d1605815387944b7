//! # truthsync-jobs
//!
//! Generation job lifecycle and streaming delivery for truthsync.
//!
//! This crate provides:
//! - The image normalizer (orientation correction, portrait policy,
//!   bounded downscale, JPEG re-encode)
//! - The chunk reconciler (native fragment passthrough or boundary-aware
//!   fallback synthesis)
//! - The in-process job registry polled by the status endpoint
//! - The generation pipeline orchestrating validation, inference,
//!   chunk delivery, and persistence
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use truthsync_jobs::{GenerationPipeline, JobRegistry, UploadedImage};
//!
//! let registry = JobRegistry::new();
//! let pipeline = GenerationPipeline::new(registry.clone(), backend, articles);
//!
//! let job_id = truthsync_core::new_job_id("req");
//! let outcome = pipeline
//!     .execute(&job_id, upload, "촬영 방향: portrait", None)
//!     .await?;
//! println!("saved: {}", outcome.saved_to_db);
//! ```

pub mod chunker;
pub mod normalize;
pub mod pipeline;
pub mod registry;

// Re-export core types
pub use truthsync_core::*;

pub use chunker::reconcile;
pub use normalize::{normalize, NormalizedImage};
pub use pipeline::{GenerationPipeline, PacingConfig, StreamEvent, UploadedImage};
pub use registry::JobRegistry;
