//! Error types for truthsync.

use thiserror::Error;

/// Result type alias using truthsync's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for truthsync operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Article not found
    #[error("Article not found: {0}")]
    ArticleNotFound(i64),

    /// Job not found in the registry
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Uploaded payload is not an image content type
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Uploaded image exceeds the size cap
    #[error("Image too large: {0} bytes")]
    ImageTooLarge(usize),

    /// Uploaded bytes could not be decoded as an image
    #[error("Undecodable image: {0}")]
    ImageUndecodable(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Job lifecycle contract violation (duplicate id, invalid transition)
    #[error("Job error: {0}")]
    Job(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that reject the upload before any generation runs.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedMediaType(_) | Error::ImageTooLarge(_) | Error::ImageUndecodable(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_article_not_found() {
        let err = Error::ArticleNotFound(42);
        assert_eq!(err.to_string(), "Article not found: 42");
    }

    #[test]
    fn test_error_display_job_not_found() {
        let err = Error::JobNotFound("req_abc".to_string());
        assert_eq!(err.to_string(), "Job not found: req_abc");
    }

    #[test]
    fn test_error_display_inference() {
        let err = Error::Inference("model timeout".to_string());
        assert_eq!(err.to_string(), "Inference error: model timeout");
    }

    #[test]
    fn test_validation_classification() {
        assert!(Error::UnsupportedMediaType("text/plain".into()).is_validation());
        assert!(Error::ImageTooLarge(11_000_000).is_validation());
        assert!(Error::ImageUndecodable("bad header".into()).is_validation());
        assert!(!Error::Inference("boom".into()).is_validation());
        assert!(!Error::Job("duplicate".into()).is_validation());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
