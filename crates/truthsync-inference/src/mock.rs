//! Scripted mock vision backend for deterministic testing.
//!
//! ## Usage
//!
//! ```rust
//! use truthsync_inference::mock::MockVisionBackend;
//!
//! let backend = MockVisionBackend::new()
//!     .with_fragments(vec!["Breaking: ".into(), "a fire downtown.".into()]);
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use truthsync_core::{Error, Result};

use crate::prompt::ArticlePrompt;
use crate::vision::{FragmentFn, VisionBackend};

#[derive(Debug, Clone)]
struct MockConfig {
    response: String,
    fragments: Vec<String>,
    fail_with: Option<String>,
    model: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            response: "Mock article body. Generated for tests.".to_string(),
            fragments: Vec::new(),
            fail_with: None,
            model: "mock-vision".to_string(),
        }
    }
}

/// Mock vision backend with a scripted outcome.
#[derive(Clone, Default)]
pub struct MockVisionBackend {
    config: Arc<MockConfig>,
    calls: Arc<Mutex<Vec<ArticlePrompt>>>,
}

impl MockVisionBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the final response returned without any streamed fragments.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).response = response.into();
        self
    }

    /// Script native streaming: each fragment is delivered through the
    /// callback and the final text is their concatenation.
    pub fn with_fragments(mut self, fragments: Vec<String>) -> Self {
        Arc::make_mut(&mut self.config).fragments = fragments;
        self
    }

    /// Make every generation call fail with the given message.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).fail_with = Some(message.into());
        self
    }

    /// Number of generation calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Prompts passed to generation calls, in order.
    pub fn prompts(&self) -> Vec<ArticlePrompt> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VisionBackend for MockVisionBackend {
    async fn generate(
        &self,
        _image_data: &[u8],
        prompt: &ArticlePrompt,
        on_fragment: &FragmentFn,
    ) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(prompt.clone());
        }

        if let Some(message) = &self.config.fail_with {
            return Err(Error::Inference(message.clone()));
        }

        if self.config.fragments.is_empty() {
            return Ok(self.config.response.clone());
        }

        let mut full = String::new();
        for fragment in &self.config.fragments {
            on_fragment(fragment);
            full.push_str(fragment);
        }
        Ok(full)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
