//! # truthsync-core
//!
//! Core types, traits, and abstractions for truthsync.
//!
//! This crate provides:
//! - The crate-wide error taxonomy and `Result` alias
//! - Job lifecycle and article/verification domain models
//! - Repository traits implemented by the database layer
//! - Service-wide default constants and environment variable names
//! - Best-effort submessage metadata scraping
//! - Structured logging field name constants

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod submessage;
pub mod traits;

pub use error::{Error, Result};
pub use models::{
    new_job_id, Article, GenerationOutcome, Job, JobState, NewArticle, NewVerification, Verdict,
    Verification,
};
pub use submessage::{extract_location, extract_orientation, orientation_hint, OrientationHint};
pub use traits::{ArticleRepository, VerificationRepository};
