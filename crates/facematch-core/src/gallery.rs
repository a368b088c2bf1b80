//! Preloaded face gallery read from a directory on disk.

use rand::seq::SliceRandom;
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("failed to read gallery directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single preloaded face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    pub file_name: String,
    pub path: PathBuf,
    /// Public URL the image is served under.
    pub url: String,
}

/// Snapshot of the preloaded faces taken at startup.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    dir: PathBuf,
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    /// List the regular, non-hidden files in `dir`, sorted by name.
    ///
    /// A missing directory is not an error: the gallery is empty and
    /// analysis requests fail until the service is restarted with faces.
    pub fn load(dir: impl AsRef<Path>, url_base: &str) -> Result<Self, GalleryError> {
        let dir = dir.as_ref().to_path_buf();

        let read_dir = match std::fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(dir = %dir.display(), "preloaded faces directory not found");
                return Ok(Self { dir, entries: Vec::new() });
            }
            Err(source) => return Err(GalleryError::ReadDir { path: dir, source }),
        };

        let url_base = url_base.trim_end_matches('/');
        let mut entries = Vec::new();
        for item in read_dir {
            let item = item.map_err(|source| GalleryError::ReadDir {
                path: dir.clone(),
                source,
            })?;
            let Ok(file_name) = item.file_name().into_string() else {
                tracing::warn!(name = ?item.file_name(), "skipping non-UTF-8 gallery file name");
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }
            let path = item.path();
            // Follows symlinks, so linked images are kept.
            if !path.is_file() {
                continue;
            }
            entries.push(GalleryEntry {
                url: format!("{url_base}/{file_name}"),
                file_name,
                path,
            });
        }
        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        tracing::info!(
            dir = %dir.display(),
            count = entries.len(),
            files = ?entries.iter().map(|e| e.file_name.as_str()).collect::<Vec<_>>(),
            "found preloaded faces"
        );

        Ok(Self { dir, entries })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Pick an entry uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&GalleryEntry> {
        self.entries.choose(rng)
    }
}
