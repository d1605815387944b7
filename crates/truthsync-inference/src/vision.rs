//! Vision backend trait and the Ollama implementation.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use truthsync_core::{defaults, Error, Result};

use crate::prompt::ArticlePrompt;

/// Callback invoked with each incrementally generated text fragment,
/// in arrival order.
pub type FragmentFn = dyn Fn(&str) + Send + Sync;

/// Backend that turns an image plus prompt into a news article.
///
/// The capability is invoked exactly once per job. It may deliver zero or
/// more fragments through the callback while generating, and always
/// eventually returns the final complete text. Any failure surfaces as a
/// single classified error; no partial state is considered valid.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Generate the article text for an image.
    async fn generate(
        &self,
        image_data: &[u8],
        prompt: &ArticlePrompt,
        on_fragment: &FragmentFn,
    ) -> Result<String>;

    /// Check if the backend is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Ollama-based vision backend (e.g., gemma3n, qwen3-vl, llava).
///
/// Native token streaming is environment-dependent; when disabled the
/// single-response path fires no fragments and downstream chunking falls
/// back to boundary synthesis.
pub struct OllamaVisionBackend {
    base_url: String,
    model: String,
    stream: bool,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OllamaVisionBackend {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            stream: true,
            client: reqwest::Client::new(),
            timeout_secs: defaults::VISION_TIMEOUT_SECS,
        }
    }

    /// Enable or disable native token streaming.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Create from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `OLLAMA_URL` | `http://localhost:11434` | Ollama server URL |
    /// | `OLLAMA_VISION_MODEL` | `gemma3n:e4b` | Vision model name |
    /// | `OLLAMA_VISION_STREAM` | `true` | Native token streaming |
    /// | `OLLAMA_VISION_TIMEOUT_SECS` | `300` | Request timeout |
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_OLLAMA_URL)
            .unwrap_or_else(|_| defaults::OLLAMA_URL.to_string());
        let model = std::env::var(defaults::ENV_VISION_MODEL)
            .unwrap_or_else(|_| defaults::VISION_MODEL.to_string());
        let stream = std::env::var(defaults::ENV_VISION_STREAM)
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        let timeout_secs = std::env::var(defaults::ENV_VISION_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::VISION_TIMEOUT_SECS);

        Self::new(base_url, model)
            .with_stream(stream)
            .with_timeout_secs(timeout_secs)
    }

    fn build_request(&self, image_data: &[u8], prompt: &ArticlePrompt) -> OllamaGenerateRequest {
        use base64::Engine;
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        OllamaGenerateRequest {
            model: self.model.clone(),
            prompt: prompt.user.clone(),
            system: prompt.system.clone(),
            images: vec![image_b64],
            stream: self.stream,
        }
    }

    async fn send(&self, request: &OllamaGenerateRequest) -> Result<reqwest::Response> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Vision request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Vision API returned {}: {}",
                status, body
            )));
        }

        Ok(response)
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    system: String,
    images: Vec<String>, // base64 encoded
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// One NDJSON line of a streamed Ollama generation.
#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Parse one NDJSON stream line; empty lines yield None.
fn parse_stream_line(line: &str) -> Result<Option<OllamaStreamChunk>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<OllamaStreamChunk>(line)
        .map(Some)
        .map_err(|e| Error::Inference(format!("Failed to parse stream chunk: {}", e)))
}

#[async_trait]
impl VisionBackend for OllamaVisionBackend {
    async fn generate(
        &self,
        image_data: &[u8],
        prompt: &ArticlePrompt,
        on_fragment: &FragmentFn,
    ) -> Result<String> {
        let request = self.build_request(image_data, prompt);
        let response = self.send(&request).await?;

        if !self.stream {
            let result: OllamaGenerateResponse = response.json().await.map_err(|e| {
                Error::Inference(format!("Failed to parse vision response: {}", e))
            })?;
            info!(
                subsystem = "inference",
                component = "ollama",
                op = "generate",
                model = %self.model,
                response_len = result.response.len(),
                "Generation completed without streaming"
            );
            return Ok(result.response);
        }

        let mut body = response.bytes_stream();
        let mut buffer = String::new();
        let mut full_text = String::new();
        let mut fragments = 0usize;

        'outer: while let Some(chunk) = body.next().await {
            let bytes =
                chunk.map_err(|e| Error::Inference(format!("Stream error: {}", e)))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(pos) = buffer.find('\n') {
                let line: String = buffer.drain(..=pos).collect();
                let Some(parsed) = parse_stream_line(&line)? else {
                    continue;
                };
                if !parsed.response.is_empty() {
                    on_fragment(&parsed.response);
                    full_text.push_str(&parsed.response);
                    fragments += 1;
                }
                if parsed.done {
                    break 'outer;
                }
            }
        }

        // A final line without a trailing newline still counts.
        if let Some(parsed) = parse_stream_line(&buffer)? {
            if !parsed.response.is_empty() {
                on_fragment(&parsed.response);
                full_text.push_str(&parsed.response);
                fragments += 1;
            }
        }

        debug!(
            subsystem = "inference",
            component = "ollama",
            op = "generate",
            model = %self.model,
            fragment_count = fragments,
            response_len = full_text.len(),
            "Streamed generation completed"
        );
        Ok(full_text)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
