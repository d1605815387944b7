//! API error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use truthsync_core::Error;

/// HTTP-facing error shape; every variant renders as `{"error": message}`.
#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    PayloadTooLarge(String),
    NotFound(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::UnsupportedMediaType(ct) => {
                let shown = if ct.is_empty() { "no content type" } else { ct.as_str() };
                ApiError::BadRequest(format!("Only image uploads are accepted (got {})", shown))
            }
            Error::ImageTooLarge(size) => ApiError::PayloadTooLarge(format!(
                "Image is {} bytes; the limit is {} bytes",
                size,
                truthsync_core::defaults::MAX_UPLOAD_BYTES
            )),
            Error::ImageUndecodable(_) => {
                ApiError::BadRequest("Uploaded file is not a valid image".to_string())
            }
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::ArticleNotFound(id) => ApiError::NotFound(format!("Article not found: {}", id)),
            Error::JobNotFound(id) => ApiError::NotFound(format!("Job not found: {}", id)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_validation_failures_map_to_client_errors() {
        assert_eq!(
            status_of(Error::UnsupportedMediaType("text/plain".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::ImageTooLarge(20_000_000).into()),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_of(Error::ImageUndecodable("bad magic".into()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_mapping() {
        assert_eq!(
            status_of(Error::ArticleNotFound(9).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_generation_failure_is_internal() {
        assert_eq!(
            status_of(Error::Inference("model crashed".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
