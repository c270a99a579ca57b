//! Derives a bullet-point style description from reference images.

use crate::error::{RemixError, Result};
use crate::image::{ImageRef, RemixModel};
use crate::prompt::STYLE_SUMMARY_INSTRUCTIONS;

/// Fewest reference images a style summary needs.
pub const MIN_STYLE_IMAGES: usize = 2;

/// Checks the style image count.
pub fn validate_style_count(count: usize) -> Result<()> {
    if count < MIN_STYLE_IMAGES {
        return Err(RemixError::InvalidRequest(format!(
            "at least {} reference style images are required, got {}",
            MIN_STYLE_IMAGES, count
        )));
    }
    Ok(())
}

/// Asks the model for the shared visual style of `style_images`.
pub async fn summarize_style<M>(model: &M, style_images: &[ImageRef]) -> Result<String>
where
    M: RemixModel + ?Sized,
{
    validate_style_count(style_images.len())?;
    tracing::info!(images = style_images.len(), "summarizing reference style");

    let summary = model
        .describe(style_images, STYLE_SUMMARY_INSTRUCTIONS)
        .await?;
    let summary = summary.trim();
    if summary.is_empty() {
        return Err(RemixError::EmptyResponse(
            "Received an empty style description".into(),
        ));
    }
    Ok(summary.to_string())
}
