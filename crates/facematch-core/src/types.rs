use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// An image submitted for comparison: an upload or a gallery file.
#[derive(Debug, Clone)]
pub struct FaceImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FaceImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Image format sniffed from the leading magic bytes.
    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }

    /// MIME type of the sniffed format, `application/octet-stream` if unknown.
    pub fn mime_type(&self) -> &'static str {
        self.format()
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream")
    }
}

/// Confidence thresholds published alongside a comparison, keyed by the
/// false accept rate they correspond to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(rename = "1e-3")]
    pub e3: f64,
    #[serde(rename = "1e-4")]
    pub e4: f64,
    #[serde(rename = "1e-5")]
    pub e5: f64,
}

/// Outcome of comparing two faces.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Similarity confidence in [0, 100].
    pub confidence: f64,
    pub thresholds: Option<Thresholds>,
    /// Identifier assigned by the comparison service, if any.
    pub request_id: Option<String>,
}

impl Comparison {
    /// Integer score reported to clients.
    pub fn similarity_score(&self) -> i64 {
        similarity_score(self.confidence)
    }

    /// Whether the confidence clears the 1e-5 false accept threshold.
    pub fn is_likely_same_person(&self) -> bool {
        self.thresholds
            .as_ref()
            .is_some_and(|t| self.confidence >= t.e5)
    }
}

/// Round a 0–100 confidence to the nearest integer, ties to even.
pub fn similarity_score(confidence: f64) -> i64 {
    if !confidence.is_finite() {
        return 0;
    }
    confidence.round_ties_even().clamp(0.0, 100.0) as i64
}

/// Response body of a successful face analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub match_name: String,
    pub match_image_url: String,
    pub similarity_score: i64,
    pub match_insta: Option<String>,
}
