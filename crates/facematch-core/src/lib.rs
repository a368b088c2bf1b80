//! facematch-core — Face matching against a preloaded gallery.
//!
//! Picks a gallery face, delegates the similarity computation to a
//! [`Comparer`] and turns the outcome into a [`MatchReport`].

pub mod analyzer;
pub mod compare;
pub mod gallery;
pub mod types;

pub use analyzer::{AnalyzeError, Analyzer, DEFAULT_MATCH_NAMES};
pub use compare::{CompareError, Comparer};
pub use gallery::{Gallery, GalleryEntry, GalleryError};
pub use types::{Comparison, FaceImage, MatchReport, Thresholds};

/// Directory of preloaded faces, relative to the static root.
pub const PRELOADED_FACES_SUBDIR: &str = "preloaded_ai_faces";

/// URL prefix under which preloaded faces are served.
pub const PRELOADED_FACES_URL_BASE: &str = "/static/preloaded_ai_faces";
