//! Single remix: load 1-5 images, pick the prompt, call the model, write the results.

use crate::error::Result;
use crate::image::{
    load_images, validate_remix_count, GeneratedImage, GenerationMetadata, ImageRef, RemixModel,
};
use crate::output::OutputWriter;
use crate::prompt::build_prompt;
use serde::Serialize;
use std::path::PathBuf;

/// What a remix produced.
#[derive(Debug, Clone, Serialize)]
pub struct RemixOutcome {
    /// Prompt sent to the model.
    pub prompt: String,
    /// Written files, in response order.
    pub files: Vec<PathBuf>,
    /// Returned images, parallel to `files`.
    #[serde(skip)]
    pub images: Vec<GeneratedImage>,
    /// Text the model returned alongside the images.
    pub messages: Vec<String>,
    /// Call metadata.
    pub metadata: GenerationMetadata,
}

/// Remixes the images at `paths` and writes the results with `writer`.
///
/// The count is checked before any file is read.
pub async fn remix_files<M>(
    model: &M,
    paths: &[PathBuf],
    user_prompt: Option<&str>,
    writer: &OutputWriter,
) -> Result<RemixOutcome>
where
    M: RemixModel + ?Sized,
{
    validate_remix_count(paths.len())?;
    let images = load_images(paths)?;
    remix_images(model, &images, user_prompt, writer).await
}

/// Remixes already-loaded images and writes the results with `writer`.
pub async fn remix_images<M>(
    model: &M,
    images: &[ImageRef],
    user_prompt: Option<&str>,
    writer: &OutputWriter,
) -> Result<RemixOutcome>
where
    M: RemixModel + ?Sized,
{
    validate_remix_count(images.len())?;
    let prompt = build_prompt(images.len(), user_prompt);
    tracing::info!(
        images = images.len(),
        model = model.name(),
        "remixing images"
    );

    let result = model.remix(images, &prompt).await?;
    let files = writer.write(&result)?;

    Ok(RemixOutcome {
        prompt,
        files,
        images: result.images,
        messages: result.texts,
        metadata: result.metadata,
    })
}
