//! Service-wide default constants and environment variable names.

/// Maximum accepted upload size for an image payload (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Normalized images are downscaled to fit within this bounding box.
pub const MAX_IMAGE_WIDTH: u32 = 1920;
pub const MAX_IMAGE_HEIGHT: u32 = 1080;

/// JPEG re-encode quality for normalized images.
pub const JPEG_QUALITY: u8 = 85;

/// Maximum tokens accumulated into one synthesized fallback chunk.
pub const FALLBACK_CHUNK_MAX_TOKENS: usize = 50;

/// Pacing delay between push events for natively streamed fragments (ms).
pub const NATIVE_CHUNK_DELAY_MS: u64 = 100;

/// Pacing delay between push events for synthesized fallback chunks (ms).
pub const FALLBACK_CHUNK_DELAY_MS: u64 = 150;

/// Pause after the `started` event before the processing preamble (ms).
pub const STARTED_DELAY_MS: u64 = 100;

/// Pause between the informational processing preamble events (ms).
pub const PREAMBLE_DELAY_MS: u64 = 500;

/// Derived article titles are truncated to this many characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Default page size for article listings.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Hard cap on article listing page size.
pub const MAX_LIST_LIMIT: i64 = 200;

/// Default Ollama server URL.
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default vision model used for article generation.
pub const VISION_MODEL: &str = "gemma3n:e4b";

/// Default request timeout for the vision backend (seconds).
pub const VISION_TIMEOUT_SECS: u64 = 300;

/// Environment variable: PostgreSQL connection URL.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

/// Environment variable: HTTP bind address.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

/// Default HTTP bind address.
pub const BIND_ADDR: &str = "0.0.0.0:8000";

/// Environment variable: Ollama base URL.
pub const ENV_OLLAMA_URL: &str = "OLLAMA_URL";

/// Environment variable: vision model name.
pub const ENV_VISION_MODEL: &str = "OLLAMA_VISION_MODEL";

/// Environment variable: enable native token streaming from the model.
pub const ENV_VISION_STREAM: &str = "OLLAMA_VISION_STREAM";

/// Environment variable: vision request timeout in seconds.
pub const ENV_VISION_TIMEOUT_SECS: &str = "OLLAMA_VISION_TIMEOUT_SECS";
