//! Image loading, model access and shared image types.

mod loader;
mod provider;
pub mod providers;
mod types;

pub use loader::{load_bytes, load_image, load_images};
pub use provider::{validate_remix_count, RemixModel, MAX_REMIX_IMAGES};
pub use types::{
    GeneratedImage, GenerationMetadata, GenerationResult, ImageFormat, ImageRef,
};

pub(crate) use types::stem_of;
