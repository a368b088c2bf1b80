use crate::config::FacePlusPlusConfig;
use async_trait::async_trait;
use facematch_core::{CompareError, Comparer, Comparison, FaceImage, Thresholds};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Marker Face++ puts in `error_message` when an image has no detectable face.
const NO_FACE_FOUND: &str = "NO_FACE_FOUND";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid Face++ configuration: {0}")]
    Config(String),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Body of a `compare` response. Every field is optional: error responses
/// only carry `error_message`, and `confidence` is absent when no face was
/// compared.
#[derive(Debug, Deserialize)]
struct CompareResponse {
    request_id: Option<String>,
    confidence: Option<f64>,
    thresholds: Option<Thresholds>,
    error_message: Option<String>,
    time_used: Option<u64>,
}

/// Face++ `compare` client.
pub struct FacePlusPlus {
    http: reqwest::Client,
    config: FacePlusPlusConfig,
}

impl FacePlusPlus {
    pub fn new(config: FacePlusPlusConfig) -> Result<Self, ClientError> {
        config.validate().map_err(ClientError::Config)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("facematch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        tracing::info!(url = %config.compare_url, timeout_secs = config.timeout_secs, "Face++ client ready");
        Ok(Self { http, config })
    }

    fn image_part(image: &FaceImage) -> Result<Part, reqwest::Error> {
        Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(image.mime_type())
    }

    fn form(&self, probe: &FaceImage, candidate: &FaceImage) -> Result<Form, reqwest::Error> {
        Ok(Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("api_secret", self.config.api_secret.clone())
            .part("image_file1", Self::image_part(probe)?)
            .part("image_file2", Self::image_part(candidate)?))
    }
}

#[async_trait]
impl Comparer for FacePlusPlus {
    fn name(&self) -> &str {
        "faceplusplus"
    }

    async fn compare(
        &self,
        probe: &FaceImage,
        candidate: &FaceImage,
    ) -> Result<Comparison, CompareError> {
        let form = self
            .form(probe, candidate)
            .map_err(|e| CompareError::Unavailable(format!("building request: {e}")))?;

        let response = self
            .http
            .post(&self.config.compare_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Face++ request failed");
                CompareError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!(error = %e, %status, "failed to read Face++ response body");
            CompareError::Unavailable(e.to_string())
        })?;
        tracing::debug!(%status, body = %body, "Face++ response");

        interpret(status, &body)
    }
}

/// Map a raw `compare` response onto a comparison outcome.
///
/// An `error_message` wins over the HTTP status: Face++ reports bad input
/// (no face, bad image) with 4xx codes and a message worth passing on.
pub fn interpret(status: StatusCode, body: &str) -> Result<Comparison, CompareError> {
    let parsed = serde_json::from_str::<CompareResponse>(body);

    if let Ok(CompareResponse {
        error_message: Some(message),
        ..
    }) = &parsed
    {
        tracing::info!(%status, error_message = %message, "Face++ returned an error");
        return Err(if message.contains(NO_FACE_FOUND) {
            CompareError::NoFaceFound(message.clone())
        } else {
            CompareError::Rejected(message.clone())
        });
    }

    if !status.is_success() {
        return Err(CompareError::Unavailable(format!("HTTP {status}")));
    }

    let response = parsed
        .map_err(|e| CompareError::Unavailable(format!("malformed response: {e}")))?;
    if let Some(ms) = response.time_used {
        tracing::debug!(time_used_ms = ms, "Face++ compare timing");
    }

    Ok(Comparison {
        confidence: response.confidence.unwrap_or(0.0),
        thresholds: response.thresholds,
        request_id: response.request_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String) -> FacePlusPlusConfig {
        FacePlusPlusConfig {
            compare_url: url,
            api_key: "test-key".into(),
            api_secret: "test-secret".into(),
            timeout_secs: 5,
        }
    }

    // ASCII payloads keep the multipart body matchable as a string.
    fn images() -> (FaceImage, FaceImage) {
        (
            FaceImage::new("me.png", b"probe-bytes".to_vec()),
            FaceImage::new("star.png", b"candidate-bytes".to_vec()),
        )
    }

    #[test]
    fn test_interpret_success() {
        let body = json!({
            "request_id": "1470378968,c6f50ec6",
            "confidence": 97.3,
            "thresholds": {"1e-3": 62.327, "1e-4": 69.101, "1e-5": 73.975},
            "time_used": 473
        })
        .to_string();
        let c = interpret(StatusCode::OK, &body).unwrap();
        assert!((c.confidence - 97.3).abs() < 1e-9);
        assert_eq!(c.request_id.as_deref(), Some("1470378968,c6f50ec6"));
        assert!(c.thresholds.is_some());
    }

    #[test]
    fn test_interpret_missing_confidence_is_zero() {
        let c = interpret(StatusCode::OK, r#"{"request_id": "x", "faces1": []}"#).unwrap();
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn test_interpret_no_face() {
        let err = interpret(
            StatusCode::BAD_REQUEST,
            r#"{"error_message": "NO_FACE_FOUND: image_file1"}"#,
        )
        .unwrap_err();
        assert_eq!(err, CompareError::NoFaceFound("NO_FACE_FOUND: image_file1".into()));
    }

    #[test]
    fn test_interpret_other_error_message() {
        let err = interpret(
            StatusCode::FORBIDDEN,
            r#"{"error_message": "CONCURRENCY_LIMIT_EXCEEDED"}"#,
        )
        .unwrap_err();
        assert_eq!(err, CompareError::Rejected("CONCURRENCY_LIMIT_EXCEEDED".into()));
    }

    #[test]
    fn test_interpret_error_message_with_ok_status() {
        let err = interpret(StatusCode::OK, r#"{"error_message": "IMAGE_ERROR_UNSUPPORTED_FORMAT"}"#)
            .unwrap_err();
        assert!(matches!(err, CompareError::Rejected(_)));
    }

    #[test]
    fn test_interpret_bad_gateway_without_message() {
        let err = interpret(StatusCode::BAD_GATEWAY, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, CompareError::Unavailable(_)));
    }

    #[test]
    fn test_interpret_malformed_ok_body() {
        let err = interpret(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, CompareError::Unavailable(_)));
    }

    #[test]
    fn test_new_rejects_missing_credentials() {
        let result = FacePlusPlus::new(FacePlusPlusConfig::default());
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[tokio::test]
    async fn test_compare_posts_multipart_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/facepp/v3/compare"))
            .and(body_string_contains("name=\"api_key\""))
            .and(body_string_contains("test-key"))
            .and(body_string_contains("name=\"image_file1\"; filename=\"me.png\""))
            .and(body_string_contains("name=\"image_file2\"; filename=\"star.png\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "request_id": "abc",
                "confidence": 64.2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = FacePlusPlus::new(config(format!("{}/facepp/v3/compare", server.uri()))).unwrap();
        let (probe, candidate) = images();
        let c = client.compare(&probe, &candidate).await.unwrap();
        assert!((c.confidence - 64.2).abs() < 1e-9);
        assert_eq!(c.request_id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_compare_no_face_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error_message": "NO_FACE_FOUND"})),
            )
            .mount(&server)
            .await;

        let client = FacePlusPlus::new(config(server.uri())).unwrap();
        let (probe, candidate) = images();
        let err = client.compare(&probe, &candidate).await.unwrap_err();
        assert!(matches!(err, CompareError::NoFaceFound(_)));
    }

    #[tokio::test]
    async fn test_compare_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = FacePlusPlus::new(config(server.uri())).unwrap();
        let (probe, candidate) = images();
        let err = client.compare(&probe, &candidate).await.unwrap_err();
        assert!(matches!(err, CompareError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_compare_connection_refused() {
        // Port 9 (discard) is not expected to be listening on loopback.
        let client = FacePlusPlus::new(config("http://127.0.0.1:9/compare".into())).unwrap();
        let (probe, candidate) = images();
        let err = client.compare(&probe, &candidate).await.unwrap_err();
        assert!(matches!(err, CompareError::Unavailable(_)));
    }
}
