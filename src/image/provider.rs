//! Remote model trait.

use crate::error::{RemixError, Result};
use crate::image::types::{GenerationResult, ImageRef};
use async_trait::async_trait;

/// Largest number of images accepted by one remix call.
pub const MAX_REMIX_IMAGES: usize = 5;

/// A generative model that takes images plus an instruction.
///
/// Calls are made once; failures surface to the caller without retries.
#[async_trait]
pub trait RemixModel: Send + Sync {
    /// Submits `images` (in order) with `prompt` and returns the generated images.
    ///
    /// Fails with [`RemixError::EmptyResponse`] if the model sent no image back.
    async fn remix(&self, images: &[ImageRef], prompt: &str) -> Result<GenerationResult>;

    /// Submits `images` with `instruction` and returns the model's text answer.
    async fn describe(&self, images: &[ImageRef], instruction: &str) -> Result<String>;

    /// Returns the name of this model for display.
    fn name(&self) -> &str;
}

/// Checks the 1..=5 image bound of a remix call.
pub fn validate_remix_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(RemixError::InvalidRequest(
            "at least one image is required".into(),
        ));
    }
    if count > MAX_REMIX_IMAGES {
        return Err(RemixError::InvalidRequest(format!(
            "at most {} images can be remixed at once, got {}",
            MAX_REMIX_IMAGES, count
        )));
    }
    Ok(())
}
