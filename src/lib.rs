#![warn(missing_docs)]
//! nanoremix - remix and restyle photos with Gemini image models.
//!
//! Two workflows are provided:
//!
//! - **Remix**: send 1-5 images with an optional prompt and write whatever
//!   images the model returns.
//! - **Style pipeline**: summarize the shared style of reference images, let
//!   an operator approve the combined prompt, then restyle each target photo.
//!
//! # Quick Start
//!
//! ```no_run
//! use nanoremix::{remix_files, GeminiClient, OutputWriter};
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> nanoremix::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let outcome = remix_files(
//!         &client,
//!         &[PathBuf::from("man.jpeg")],
//!         None,
//!         &OutputWriter::default(),
//!     )
//!     .await?;
//!     println!("wrote {:?}", outcome.files);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `mix_images`, `style_pipeline` and `remix_server`
//!   binaries, and logging setup.

mod error;
pub mod image;
pub mod output;
pub mod pipeline;
pub mod prompt;
mod remix;

#[cfg(feature = "cli")]
#[doc(hidden)]
pub mod logging;

#[cfg(feature = "cli")]
#[doc(hidden)]
pub mod mcp;

#[cfg(test)]
mod testing;

pub use error::{RemixError, Result};

pub use crate::image::providers::{GeminiClient, GeminiClientBuilder, GeminiModel};
pub use crate::image::{
    GeneratedImage, GenerationMetadata, GenerationResult, ImageFormat, ImageRef, RemixModel,
};
pub use output::OutputWriter;
pub use pipeline::{
    ApprovalDecision, ApprovalGate, BatchReport, ConsoleGate, PipelineOutcome, StylePipeline,
    StyleRequest,
};
pub use prompt::build_prompt;
pub use remix::{remix_files, remix_images, RemixOutcome};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{RemixError, Result};
    pub use crate::image::providers::GeminiClient;
    pub use crate::image::{ImageRef, RemixModel};
    pub use crate::output::OutputWriter;
    pub use crate::pipeline::{ApprovalGate, StylePipeline, StyleRequest};
    pub use crate::remix::{remix_files, remix_images};
}
