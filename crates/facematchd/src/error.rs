//! HTTP error responses: `{"error": "..."}` with a status code.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use facematch_core::{AnalyzeError, CompareError};

pub const MSG_NO_IMAGE: &str = "No image file provided";
pub const MSG_UNSUPPORTED_IMAGE: &str = "Uploaded file is not a supported image (JPEG or PNG)";
pub const MSG_EMPTY_GALLERY: &str = "No preloaded faces available for matching";
pub const MSG_NO_FACE: &str = "No face detected in the uploaded image. Please try a clear photo.";
pub const MSG_UNAVAILABLE: &str = "Could not connect to AI analysis service.";
pub const MSG_INTERNAL: &str = "An internal server error occurred.";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn no_image() -> Self {
        Self::new(StatusCode::BAD_REQUEST, MSG_NO_IMAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

impl From<AnalyzeError> for ApiError {
    fn from(err: AnalyzeError) -> Self {
        match err {
            AnalyzeError::MissingImage => Self::no_image(),
            AnalyzeError::UnsupportedImage => {
                Self::new(StatusCode::BAD_REQUEST, MSG_UNSUPPORTED_IMAGE)
            }
            AnalyzeError::EmptyGallery => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_EMPTY_GALLERY)
            }
            AnalyzeError::Compare(CompareError::NoFaceFound(_)) => {
                Self::new(StatusCode::BAD_REQUEST, MSG_NO_FACE)
            }
            AnalyzeError::Compare(CompareError::Rejected(message)) => {
                Self::new(StatusCode::BAD_REQUEST, format!("AI API Error: {message}"))
            }
            AnalyzeError::Compare(CompareError::Unavailable(reason)) => {
                tracing::error!(%reason, "comparison service unavailable");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, MSG_UNAVAILABLE)
            }
            other @ AnalyzeError::CandidateRead { .. } => {
                tracing::error!(error = %other, "analysis failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        tracing::info!(error = %err, "malformed multipart upload");
        Self::new(err.status(), err.body_text())
    }
}

// A body that is not multipart at all carries no `user_image` file.
impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::info!(error = %rejection.body_text(), "request is not multipart");
        Self::no_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_error_mapping() {
        let cases = [
            (
                AnalyzeError::MissingImage,
                StatusCode::BAD_REQUEST,
                MSG_NO_IMAGE.to_string(),
            ),
            (
                AnalyzeError::UnsupportedImage,
                StatusCode::BAD_REQUEST,
                MSG_UNSUPPORTED_IMAGE.to_string(),
            ),
            (
                AnalyzeError::Compare(CompareError::NoFaceFound("NO_FACE_FOUND".into())),
                StatusCode::BAD_REQUEST,
                MSG_NO_FACE.to_string(),
            ),
            (
                AnalyzeError::Compare(CompareError::Rejected("INVALID_IMAGE_SIZE".into())),
                StatusCode::BAD_REQUEST,
                "AI API Error: INVALID_IMAGE_SIZE".to_string(),
            ),
            (
                AnalyzeError::Compare(CompareError::Unavailable("timeout".into())),
                StatusCode::SERVICE_UNAVAILABLE,
                MSG_UNAVAILABLE.to_string(),
            ),
        ];
        for (err, status, message) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.message, message);
        }
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = AnalyzeError::CandidateRead {
            path: "/secret/path.png".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, MSG_INTERNAL);
    }

    #[test]
    fn test_empty_gallery_is_server_error() {
        let api = ApiError::from(AnalyzeError::EmptyGallery);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, MSG_EMPTY_GALLERY);
    }
}
