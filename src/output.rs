//! Writes generated images to disk under deterministic names.

use crate::error::{RemixError, Result};
use crate::image::{GeneratedImage, GenerationResult, ImageFormat};
use std::path::{Path, PathBuf};

/// Default directory for remix results.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// File name prefix for remix results.
pub const REMIX_PREFIX: &str = "remixed_image";

/// File name prefix for style pipeline results.
pub const STYLED_PREFIX: &str = "styled_image";

/// Persists generated images as `<dir>/<prefix>_<n>.<ext>`, `n` starting at 1.
///
/// Re-running into the same directory overwrites earlier files with the same index.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
    prefix: String,
}

impl OutputWriter {
    /// Creates a writer for `dir` using the remix prefix.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: REMIX_PREFIX.to_string(),
        }
    }

    /// Sets the file name prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the `index`-th (1-based) image of `format` is written to.
    pub fn file_path(&self, index: usize, format: ImageFormat) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.prefix, index, format.extension()))
    }

    /// Writes every image of `result`, returning the written paths in order.
    pub fn write(&self, result: &GenerationResult) -> Result<Vec<PathBuf>> {
        self.write_images(&result.images)
    }

    /// Writes `images`, creating the directory first if it is missing.
    pub fn write_images(&self, images: &[GeneratedImage]) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.dir).map_err(|source| RemixError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let mut written = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            let path = self.file_path(i + 1, image.format);
            std::fs::write(&path, &image.data).map_err(|source| RemixError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), size_bytes = image.size(), "wrote image");
            written.push(path);
        }
        Ok(written)
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}
