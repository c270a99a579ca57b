//! Two-stage style pipeline.
//!
//! Reference images are summarized into a style description, the combined
//! prompt is shown to the operator, and only after approval is each target
//! photo restyled:
//!
//! ```text
//! load style images -> summarize -> approval gate -> [load photo -> remix -> write] per photo
//! ```

mod approval;
mod restyler;
mod summarizer;

pub use approval::{ApprovalDecision, ApprovalGate, ConsoleGate};
pub use restyler::{
    BatchReport, BatchRestyler, BatchSummary, PhotoOutcome, PhotoReport, PhotoSummary,
};
pub use summarizer::{summarize_style, validate_style_count, MIN_STYLE_IMAGES};

use crate::error::{RemixError, Result};
use crate::image::{load_images, stem_of, validate_remix_count, RemixModel};
use crate::prompt::build_style_prompt;
use std::collections::HashMap;
use std::path::PathBuf;

/// Default root directory for styled photos.
pub const DEFAULT_STYLE_OUTPUT_DIR: &str = "styled_output";

/// Inputs of one pipeline run.
#[derive(Debug, Clone)]
pub struct StyleRequest {
    /// Reference images (at least two).
    pub style_images: Vec<PathBuf>,
    /// Photos to restyle (at least one).
    pub photos: Vec<PathBuf>,
    /// Operator prompt combined with the style summary.
    pub base_prompt: String,
    /// Root of the per-photo output directories.
    pub output_dir: PathBuf,
    /// Also send the reference images with every photo.
    pub include_style_references: bool,
}

impl StyleRequest {
    /// Creates a request writing to [`DEFAULT_STYLE_OUTPUT_DIR`].
    pub fn new(
        style_images: Vec<PathBuf>,
        photos: Vec<PathBuf>,
        base_prompt: impl Into<String>,
    ) -> Self {
        Self {
            style_images,
            photos,
            base_prompt: base_prompt.into(),
            output_dir: PathBuf::from(DEFAULT_STYLE_OUTPUT_DIR),
            include_style_references: false,
        }
    }

    /// Sets the output root.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sends the reference images along with each photo.
    pub fn with_style_references(mut self, include: bool) -> Self {
        self.include_style_references = include;
        self
    }

    /// Checks counts and photo names before any file is read.
    ///
    /// Each photo's results go to a folder named after its stem, so two
    /// photos sharing a stem are rejected.
    pub fn validate(&self) -> Result<()> {
        validate_style_count(self.style_images.len())?;
        if self.photos.is_empty() {
            return Err(RemixError::InvalidRequest(
                "at least one target photo is required".into(),
            ));
        }
        let mut seen = HashMap::with_capacity(self.photos.len());
        for photo in &self.photos {
            if let Some(first) = seen.insert(stem_of(photo), photo) {
                return Err(RemixError::InvalidRequest(format!(
                    "{} and {} would share the output folder '{}'",
                    first.display(),
                    photo.display(),
                    stem_of(photo)
                )));
            }
        }
        if self.include_style_references {
            validate_remix_count(self.style_images.len() + 1)?;
        }
        Ok(())
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The operator declined; nothing was generated.
    Rejected {
        /// The prompt that was declined.
        prompt: String,
    },
    /// The batch ran; see the report for per-photo results.
    Completed {
        /// The approved prompt.
        prompt: String,
        /// Per-photo results.
        report: BatchReport,
    },
}

/// Runs the style pipeline against one model.
pub struct StylePipeline<'a, M: ?Sized> {
    model: &'a M,
}

impl<'a, M> StylePipeline<'a, M>
where
    M: RemixModel + ?Sized,
{
    /// Creates a pipeline using `model` for both stages.
    pub fn new(model: &'a M) -> Self {
        Self { model }
    }

    /// Summarizes the style, asks `gate`, and restyles the photos if approved.
    ///
    /// Nothing is generated and no directory is created unless the gate approves.
    pub async fn run<G>(&self, request: &StyleRequest, gate: &mut G) -> Result<PipelineOutcome>
    where
        G: ApprovalGate + ?Sized,
    {
        request.validate()?;

        let style_images = load_images(&request.style_images)?;
        let summary = summarize_style(self.model, &style_images).await?;
        let prompt = build_style_prompt(&request.base_prompt, &summary);

        let decision = gate.review(&summary, &prompt)?;
        if !decision.is_approved() {
            tracing::info!("prompt rejected, aborting without generating images");
            return Ok(PipelineOutcome::Rejected { prompt });
        }

        let mut restyler = BatchRestyler::new(self.model, &prompt, &request.output_dir);
        if request.include_style_references {
            restyler = restyler.with_style_references(style_images)?;
        }
        let report = restyler.run(&request.photos).await?;

        Ok(PipelineOutcome::Completed { prompt, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{write_png, FakeModel};
    use std::path::Path;
    use tempfile::tempdir;

    /// Gate returning a fixed decision and remembering what it was shown.
    struct ScriptedGate {
        decision: ApprovalDecision,
        shown: Vec<String>,
    }

    impl ScriptedGate {
        fn new(decision: ApprovalDecision) -> Self {
            Self {
                decision,
                shown: Vec::new(),
            }
        }
    }

    impl ApprovalGate for ScriptedGate {
        fn review(&mut self, _style_summary: &str, prompt: &str) -> Result<ApprovalDecision> {
            self.shown.push(prompt.to_string());
            Ok(self.decision)
        }
    }

    fn pngs(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
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
    async fn test_rejection_makes_no_remix_calls_and_writes_nothing() {
        let temp_dir = tempdir().unwrap();
        let output = temp_dir.path().join("styled");
        let request = StyleRequest::new(
            pngs(temp_dir.path(), &["card1", "card2"]),
            pngs(temp_dir.path(), &["beach", "city"]),
            "Make it a vintage postcard",
        )
        .with_output_dir(&output);
        let model = FakeModel::new();
        let mut gate = ScriptedGate::new(ApprovalDecision::Rejected);

        let outcome = StylePipeline::new(&model)
            .run(&request, &mut gate)
            .await
            .unwrap();

        assert!(matches!(outcome, PipelineOutcome::Rejected { .. }));
        assert_eq!(model.describe_calls().len(), 1);
        assert!(model.remix_calls().is_empty());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_approval_runs_one_call_per_photo() {
        let temp_dir = tempdir().unwrap();
        let output = temp_dir.path().join("styled");
        let photos = pngs(temp_dir.path(), &["beach", "city"]);
        let request = StyleRequest::new(
            pngs(temp_dir.path(), &["card1", "card2"]),
            photos.clone(),
            "Make it a vintage postcard",
        )
        .with_output_dir(&output);
        let model = FakeModel::new().with_summary("- Sepia tones\n- Script lettering");
        let mut gate = ScriptedGate::new(ApprovalDecision::Approved);

        let outcome = StylePipeline::new(&model)
            .run(&request, &mut gate)
            .await
            .unwrap();

        let PipelineOutcome::Completed { prompt, report } = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(gate.shown, vec![prompt.clone()]);
        assert!(prompt.starts_with("Make it a vintage postcard\n\n"));
        assert!(prompt.ends_with("- Sepia tones\n- Script lettering"));
        assert!(report.is_success());

        let calls = model.remix_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].paths, vec![photos[0].clone()]);
        assert_eq!(calls[1].paths, vec![photos[1].clone()]);
        assert!(calls.iter().all(|c| c.prompt == prompt));
        assert!(output.join("beach").join("styled_image_1.png").exists());
        assert!(output.join("city").join("styled_image_1.png").exists());
    }

    #[tokio::test]
    async fn test_style_references_sent_with_each_photo_when_enabled() {
        let temp_dir = tempdir().unwrap();
        let styles = pngs(temp_dir.path(), &["card1", "card2"]);
        let photos = pngs(temp_dir.path(), &["beach"]);
        let request = StyleRequest::new(styles.clone(), photos.clone(), "Postcard")
            .with_output_dir(temp_dir.path().join("out"))
            .with_style_references(true);
        let model = FakeModel::new();
        let mut gate = ScriptedGate::new(ApprovalDecision::Approved);

        StylePipeline::new(&model)
            .run(&request, &mut gate)
            .await
            .unwrap();

        let calls = model.remix_calls();
        assert_eq!(
            calls[0].paths,
            vec![styles[0].clone(), styles[1].clone(), photos[0].clone()]
        );
    }

    #[tokio::test]
    async fn test_single_style_image_is_rejected_before_any_call() {
        let temp_dir = tempdir().unwrap();
        let request = StyleRequest::new(
            pngs(temp_dir.path(), &["card1"]),
            pngs(temp_dir.path(), &["beach"]),
            "Postcard",
        );
        let model = FakeModel::new();
        let mut gate = ScriptedGate::new(ApprovalDecision::Approved);

        let err = StylePipeline::new(&model)
            .run(&request, &mut gate)
            .await
            .unwrap_err();

        assert!(matches!(err, RemixError::InvalidRequest(_)));
        assert!(model.describe_calls().is_empty());
        assert!(gate.shown.is_empty());
    }

    #[tokio::test]
    async fn test_photos_sharing_a_stem_are_rejected_before_any_call() {
        let temp_dir = tempdir().unwrap();
        let x = temp_dir.path().join("x");
        let y = temp_dir.path().join("y");
        std::fs::create_dir_all(&x).unwrap();
        std::fs::create_dir_all(&y).unwrap();
        let photos = vec![x.join("beach.png"), y.join("beach.jpg")];
        for photo in &photos {
            write_png(photo);
        }
        let output = temp_dir.path().join("out");
        let request = StyleRequest::new(
            pngs(temp_dir.path(), &["card1", "card2"]),
            photos,
            "Postcard",
        )
        .with_output_dir(&output);
        let model = FakeModel::new();
        let mut gate = ScriptedGate::new(ApprovalDecision::Approved);

        let err = StylePipeline::new(&model)
            .run(&request, &mut gate)
            .await
            .unwrap_err();

        assert!(matches!(err, RemixError::InvalidRequest(ref msg) if msg.contains("'beach'")));
        assert!(model.describe_calls().is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn test_validate_counts() {
        let styles = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        let photo = vec![PathBuf::from("p.png")];

        assert!(StyleRequest::new(styles.clone(), photo.clone(), "x").validate().is_ok());
        assert!(StyleRequest::new(styles.clone(), Vec::new(), "x").validate().is_err());

        let five: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("{i}.png"))).collect();
        assert!(StyleRequest::new(five.clone(), photo.clone(), "x").validate().is_ok());
        assert!(StyleRequest::new(five, photo, "x")
            .with_style_references(true)
            .validate()
            .is_err());
    }
}
