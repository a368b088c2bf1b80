//! Match analysis: pair an uploaded face with a random gallery face and
//! score them with a [`Comparer`].

use crate::compare::{CompareError, Comparer};
use crate::gallery::Gallery;
use crate::types::{FaceImage, MatchReport};
use image::ImageFormat;
use rand::seq::SliceRandom;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

/// Display names handed out with a match.
pub const DEFAULT_MATCH_NAMES: [&str; 4] = ["Alex P.", "Jordan B.", "Casey L.", "Morgan R."];

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("no image provided")]
    MissingImage,
    #[error("unsupported image format")]
    UnsupportedImage,
    #[error("no preloaded faces available for matching")]
    EmptyGallery,
    #[error("failed to read gallery image {path}: {source}")]
    CandidateRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Compare(#[from] CompareError),
}

pub struct Analyzer {
    gallery: Gallery,
    comparer: Arc<dyn Comparer>,
    names: Vec<String>,
}

impl Analyzer {
    /// An empty `names` list falls back to [`DEFAULT_MATCH_NAMES`].
    pub fn new(gallery: Gallery, comparer: Arc<dyn Comparer>, names: Vec<String>) -> Self {
        let names = if names.is_empty() {
            DEFAULT_MATCH_NAMES.iter().map(|n| n.to_string()).collect()
        } else {
            names
        };
        Self {
            gallery,
            comparer,
            names,
        }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn comparer_name(&self) -> &str {
        self.comparer.name()
    }

    /// Compare `probe` against a randomly chosen gallery face.
    pub async fn analyze(&self, probe: FaceImage) -> Result<MatchReport, AnalyzeError> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("analyze", %request_id, upload = %probe.file_name);
        self.run(probe).instrument(span).await
    }

    async fn run(&self, probe: FaceImage) -> Result<MatchReport, AnalyzeError> {
        if probe.is_empty() {
            return Err(AnalyzeError::MissingImage);
        }
        if !matches!(probe.format(), Some(ImageFormat::Jpeg | ImageFormat::Png)) {
            tracing::info!(mime = probe.mime_type(), "rejecting unsupported upload");
            return Err(AnalyzeError::UnsupportedImage);
        }

        // ThreadRng is !Send; keep it out of scope across the awaits below.
        let (entry, name) = {
            let mut rng = rand::thread_rng();
            let entry = self
                .gallery
                .choose(&mut rng)
                .ok_or(AnalyzeError::EmptyGallery)?
                .clone();
            let name = self
                .names
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(|| DEFAULT_MATCH_NAMES[0].to_string());
            (entry, name)
        };
        tracing::info!(candidate = %entry.file_name, "selected gallery face");

        let bytes = tokio::fs::read(&entry.path)
            .await
            .map_err(|source| AnalyzeError::CandidateRead {
                path: entry.path.clone(),
                source,
            })?;
        let candidate = FaceImage::new(entry.file_name.clone(), bytes);

        let comparison = self.comparer.compare(&probe, &candidate).await?;
        tracing::info!(
            confidence = comparison.confidence,
            service_request_id = comparison.request_id.as_deref().unwrap_or("-"),
            likely_same_person = comparison.is_likely_same_person(),
            "comparison complete"
        );

        Ok(MatchReport {
            match_name: name,
            match_image_url: entry.url,
            similarity_score: comparison.similarity_score(),
            match_insta: None,
        })
    }
}
