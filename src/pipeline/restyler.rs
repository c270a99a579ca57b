//! Applies an approved prompt to each target photo, one at a time.

use crate::error::{RemixError, Result};
use crate::image::{load_image, stem_of, validate_remix_count, ImageRef, RemixModel};
use crate::output::{OutputWriter, STYLED_PREFIX};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result for one photo.
#[derive(Debug)]
pub enum PhotoOutcome {
    /// The photo was restyled and its results written.
    Written {
        /// Written files.
        files: Vec<PathBuf>,
        /// Text the model returned alongside the images.
        messages: Vec<String>,
    },
    /// Loading, generation or decoding failed; the batch moved on.
    Failed {
        /// Why this photo failed.
        error: RemixError,
    },
}

/// Per-photo entry of a [`BatchReport`].
#[derive(Debug)]
pub struct PhotoReport {
    /// Source photo path.
    pub photo: PathBuf,
    /// Directory this photo's results go to.
    pub output_dir: PathBuf,
    /// What happened.
    pub outcome: PhotoOutcome,
}

impl PhotoReport {
    /// Returns true if the photo was written.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PhotoOutcome::Written { .. })
    }
}

/// Outcome of a whole batch, in photo order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per attempted photo.
    pub photos: Vec<PhotoReport>,
    /// Set when an error stopped the batch; the last entry holds that error
    /// and later photos were not attempted.
    pub aborted: bool,
}

impl BatchReport {
    /// Photos that were written.
    pub fn succeeded(&self) -> impl Iterator<Item = &PhotoReport> {
        self.photos.iter().filter(|p| p.is_success())
    }

    /// Photos that failed.
    pub fn failed(&self) -> impl Iterator<Item = &PhotoReport> {
        self.photos.iter().filter(|p| !p.is_success())
    }

    /// Returns true if every photo was written.
    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed().next().is_none()
    }

    /// Serializable summary for `--json` output.
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            succeeded: self.succeeded().count(),
            failed: self.failed().count(),
            aborted: self.aborted,
            photos: self
                .photos
                .iter()
                .map(|p| match &p.outcome {
                    PhotoOutcome::Written { files, messages } => PhotoSummary {
                        photo: p.photo.clone(),
                        success: true,
                        files: files.clone(),
                        messages: messages.clone(),
                        error: None,
                    },
                    PhotoOutcome::Failed { error } => PhotoSummary {
                        photo: p.photo.clone(),
                        success: false,
                        files: Vec::new(),
                        messages: Vec::new(),
                        error: Some(error.to_string()),
                    },
                })
                .collect(),
        }
    }
}

/// JSON view of a [`BatchReport`].
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    /// Number of photos written.
    pub succeeded: usize,
    /// Number of photos that failed.
    pub failed: usize,
    /// Whether the batch stopped early.
    pub aborted: bool,
    /// Per-photo details.
    pub photos: Vec<PhotoSummary>,
}

/// JSON view of a [`PhotoReport`].
#[derive(Debug, Serialize)]
pub struct PhotoSummary {
    /// Source photo path.
    pub photo: PathBuf,
    /// Whether results were written.
    pub success: bool,
    /// Written files.
    pub files: Vec<PathBuf>,
    /// Model text, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
    /// Failure message for a failed photo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Restyles target photos with an approved prompt.
///
/// Each photo goes to `<output_root>/<photo stem>/`. A failing photo is
/// recorded and skipped. Errors that [`RemixError::aborts_batch`] stop the run;
/// the returned report is then marked aborted and keeps the photos written so far.
pub struct BatchRestyler<'a, M: ?Sized> {
    model: &'a M,
    prompt: &'a str,
    output_root: PathBuf,
    style_references: Vec<ImageRef>,
}

impl<'a, M> BatchRestyler<'a, M>
where
    M: RemixModel + ?Sized,
{
    /// Creates a restyler sending `[photo] + prompt` per call.
    pub fn new(model: &'a M, prompt: &'a str, output_root: impl Into<PathBuf>) -> Self {
        Self {
            model,
            prompt,
            output_root: output_root.into(),
            style_references: Vec::new(),
        }
    }

    /// Sends `references` ahead of each photo. The total must stay within the remix limit.
    pub fn with_style_references(mut self, references: Vec<ImageRef>) -> Result<Self> {
        validate_remix_count(references.len() + 1)?;
        self.style_references = references;
        Ok(self)
    }

    /// Processes `photos` strictly in order.
    ///
    /// Fails only if the output root cannot be created.
    pub async fn run(&self, photos: &[PathBuf]) -> Result<BatchReport> {
        std::fs::create_dir_all(&self.output_root).map_err(|source| RemixError::Write {
            path: self.output_root.clone(),
            source,
        })?;

        let mut report = BatchReport::default();
        for photo in photos {
            let output_dir = self.output_root.join(stem_of(photo));
            tracing::info!(photo = %photo.display(), "processing photo");

            let outcome = match self.restyle_one(photo, &output_dir).await {
                Ok(outcome) => outcome,
                Err(error) if error.aborts_batch() => {
                    tracing::error!(
                        photo = %photo.display(),
                        written = report.succeeded().count(),
                        remaining = photos.len() - report.photos.len() - 1,
                        "aborting batch: {error}"
                    );
                    report.aborted = true;
                    PhotoOutcome::Failed { error }
                }
                Err(error) => {
                    tracing::warn!(photo = %photo.display(), "skipping photo: {error}");
                    PhotoOutcome::Failed { error }
                }
            };

            report.photos.push(PhotoReport {
                photo: photo.clone(),
                output_dir,
                outcome,
            });
            if report.aborted {
                break;
            }
        }
        Ok(report)
    }

    async fn restyle_one(&self, photo: &Path, output_dir: &Path) -> Result<PhotoOutcome> {
        let photo = load_image(photo)?;
        let mut images = self.style_references.clone();
        images.push(photo);

        let result = self.model.remix(&images, self.prompt).await?;
        let files = OutputWriter::new(output_dir)
            .with_prefix(STYLED_PREFIX)
            .write(&result)?;

        Ok(PhotoOutcome::Written {
            files,
            messages: result.texts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageFormat;
    use crate::testing::{png_bytes, write_png, FakeModel};
    use tempfile::tempdir;

    fn photos_in(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(format!("{name}.png"));
                write_png(&path);
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn test_each_photo_gets_its_own_directory() {
        let temp_dir = tempdir().unwrap();
        let photos = photos_in(temp_dir.path(), &["beach", "city"]);
        let root = temp_dir.path().join("styled");
        let model = FakeModel::new();

        let report = BatchRestyler::new(&model, "postcard", &root)
            .run(&photos)
            .await
            .unwrap();

        assert!(report.is_success());
        assert!(root.join("beach").join("styled_image_1.png").exists());
        assert!(root.join("city").join("styled_image_1.png").exists());

        let calls = model.remix_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].paths, vec![photos[0].clone()]);
        assert_eq!(calls[1].paths, vec![photos[1].clone()]);
        assert!(calls.iter().all(|c| c.prompt == "postcard"));
    }

    #[tokio::test]
    async fn test_failure_on_one_photo_continues_and_is_reported() {
        let temp_dir = tempdir().unwrap();
        let photos = photos_in(temp_dir.path(), &["a", "b"]);
        let root = temp_dir.path().join("styled");
        let model = FakeModel::new().failing_on("b");

        let report = BatchRestyler::new(&model, "postcard", &root)
            .run(&photos)
            .await
            .unwrap();

        assert_eq!(model.remix_calls().len(), 2);
        assert!(!report.is_success());
        assert_eq!(report.succeeded().count(), 1);

        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].photo, photos[1]);
        assert!(matches!(
            failed[0].outcome,
            PhotoOutcome::Failed { ref error } if error.is_api_error()
        ));
        assert!(root.join("a").join("styled_image_1.png").exists());
        assert!(!root.join("b").exists());
    }

    #[tokio::test]
    async fn test_failure_on_first_photo_still_attempts_second() {
        let temp_dir = tempdir().unwrap();
        let photos = photos_in(temp_dir.path(), &["a", "b"]);
        let model = FakeModel::new().failing_on("a");

        let report = BatchRestyler::new(&model, "postcard", temp_dir.path().join("out"))
            .run(&photos)
            .await
            .unwrap();

        assert_eq!(model.remix_calls().len(), 2);
        assert!(!report.photos[0].is_success());
        assert!(report.photos[1].is_success());
    }

    #[tokio::test]
    async fn test_missing_photo_is_skipped_without_model_call() {
        let temp_dir = tempdir().unwrap();
        let mut photos = photos_in(temp_dir.path(), &["present"]);
        photos.insert(0, temp_dir.path().join("absent.png"));
        let model = FakeModel::new();

        let report = BatchRestyler::new(&model, "postcard", temp_dir.path().join("out"))
            .run(&photos)
            .await
            .unwrap();

        assert_eq!(model.remix_calls().len(), 1);
        assert!(matches!(
            report.photos[0].outcome,
            PhotoOutcome::Failed {
                error: RemixError::NotFound { .. }
            }
        ));
        assert!(report.photos[1].is_success());

        let summary = report.summary();
        assert_eq!((summary.succeeded, summary.failed), (1, 1));
        assert!(summary.photos[0].error.as_deref().unwrap().contains("absent.png"));
    }

    #[tokio::test]
    async fn test_style_references_precede_photo() {
        let temp_dir = tempdir().unwrap();
        let photos = photos_in(temp_dir.path(), &["portrait"]);
        let refs = vec![
            ImageRef::new("ref1.png", png_bytes(), ImageFormat::Png),
            ImageRef::new("ref2.png", png_bytes(), ImageFormat::Png),
        ];
        let model = FakeModel::new();

        BatchRestyler::new(&model, "postcard", temp_dir.path().join("out"))
            .with_style_references(refs)
            .unwrap()
            .run(&photos)
            .await
            .unwrap();

        let calls = model.remix_calls();
        assert_eq!(
            calls[0].paths,
            vec![
                PathBuf::from("ref1.png"),
                PathBuf::from("ref2.png"),
                photos[0].clone()
            ]
        );
    }

    #[test]
    fn test_too_many_style_references_rejected() {
        let model = FakeModel::new();
        let refs: Vec<_> = (0..5)
            .map(|i| ImageRef::new(format!("ref{i}.png"), png_bytes(), ImageFormat::Png))
            .collect();

        let result = BatchRestyler::new(&model, "postcard", "out").with_style_references(refs);
        assert!(matches!(result, Err(RemixError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unwritable_output_aborts_batch() {
        let temp_dir = tempdir().unwrap();
        let photos = photos_in(temp_dir.path(), &["a", "b"]);
        let root = temp_dir.path().join("styled");
        std::fs::create_dir_all(&root).unwrap();
        // A plain file where photo a's directory should go
        std::fs::write(root.join("a"), b"blocker").unwrap();
        let model = FakeModel::new();

        let report = BatchRestyler::new(&model, "postcard", &root)
            .run(&photos)
            .await
            .unwrap();

        assert!(report.aborted);
        assert!(!report.is_success());
        assert_eq!(report.photos.len(), 1);
        assert!(matches!(
            report.photos[0].outcome,
            PhotoOutcome::Failed {
                error: RemixError::Write { .. }
            }
        ));
        assert_eq!(model.remix_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_aborted_batch_keeps_photos_already_written() {
        let temp_dir = tempdir().unwrap();
        let photos = photos_in(temp_dir.path(), &["a", "b", "c"]);
        let root = temp_dir.path().join("styled");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("b"), b"blocker").unwrap();
        let model = FakeModel::new();

        let report = BatchRestyler::new(&model, "postcard", &root)
            .run(&photos)
            .await
            .unwrap();

        assert!(report.aborted);
        assert_eq!(model.remix_calls().len(), 2);
        assert_eq!(report.photos.len(), 2);
        assert!(report.photos[0].is_success());
        assert!(root.join("a").join("styled_image_1.png").exists());

        let summary = report.summary();
        assert!(summary.aborted);
        assert_eq!((summary.succeeded, summary.failed), (1, 1));
        assert!(summary.photos[1].error.as_deref().unwrap().contains("styled"));
    }
}
