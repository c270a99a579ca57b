//! Core image types shared by the loader, the model client and the writer.

use crate::error::{RemixError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Image formats accepted by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Parses a MIME type as sent back by the model.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    pub(crate) fn as_image_crate_format(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::WebP => image::ImageFormat::WebP,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// An input image loaded from disk.
///
/// Created by the loader and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    path: PathBuf,
    data: Vec<u8>,
    format: ImageFormat,
}

impl ImageRef {
    /// Creates an image reference from already-validated bytes.
    pub fn new(path: impl Into<PathBuf>, data: Vec<u8>, format: ImageFormat) -> Self {
        Self {
            path: path.into(),
            data,
            format,
        }
    }

    /// Source path (or upload name) of the image.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Detected image format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type sent along with the bytes.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// File stem of the source path, used to name per-photo output folders.
    pub fn stem(&self) -> String {
        stem_of(&self.path)
    }
}

/// Returns the file stem of `path`, falling back to `"image"`.
pub(crate) fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

/// Metadata about one model call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// One image returned by the model.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or processed"]
pub struct GeneratedImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// Image format.
    pub format: ImageFormat,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(data: Vec<u8>, format: ImageFormat) -> Self {
        Self { data, format }
    }

    /// Creates a generated image, preferring the format found in the bytes
    /// over the one claimed by the API.
    pub fn from_bytes(data: Vec<u8>, claimed: Option<ImageFormat>) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data)
            .or(claimed)
            .ok_or_else(|| RemixError::Decode("Unknown image format".into()))?;
        Ok(Self::new(data, format))
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Everything the model returned for one (prompt, images) call.
#[derive(Debug, Clone, Default)]
pub struct GenerationResult {
    /// Returned images, in response order.
    pub images: Vec<GeneratedImage>,
    /// Text parts the model sent alongside the images.
    pub texts: Vec<String>,
    /// Call metadata.
    pub metadata: GenerationMetadata,
}

impl GenerationResult {
    /// Returns true if no image came back.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
