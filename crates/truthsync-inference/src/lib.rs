//! # truthsync-inference
//!
//! Vision model inference backend abstraction for truthsync.
//!
//! This crate provides:
//! - The `VisionBackend` trait: one generation call per job, with an
//!   optional incremental fragment callback
//! - Ollama implementation with native NDJSON token streaming
//! - Prompt construction with orientation-aware system instructions
//! - A scripted mock backend for tests (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use truthsync_inference::{ArticlePrompt, OllamaVisionBackend, VisionBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OllamaVisionBackend::from_env();
//!     let prompt = ArticlePrompt::build("촬영 방향: portrait, street scene");
//!     let article = backend
//!         .generate(&[0u8; 4], &prompt, &|fragment| print!("{fragment}"))
//!         .await
//!         .unwrap();
//!     println!("{article}");
//! }
//! ```

pub mod prompt;
pub mod vision;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use truthsync_core::*;

pub use prompt::ArticlePrompt;
pub use vision::{FragmentFn, OllamaVisionBackend, VisionBackend};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockVisionBackend;
