use crate::types::{Comparison, FaceImage};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error("no face found: {0}")]
    NoFaceFound(String),
    #[error("comparison rejected: {0}")]
    Rejected(String),
    #[error("comparison service unavailable: {0}")]
    Unavailable(String),
}

/// Strategy for scoring how alike the faces in two images are.
#[async_trait]
pub trait Comparer: Send + Sync {
    /// Short identifier of the backing service, reported by `/status`.
    fn name(&self) -> &str;

    async fn compare(
        &self,
        probe: &FaceImage,
        candidate: &FaceImage,
    ) -> Result<Comparison, CompareError>;
}
