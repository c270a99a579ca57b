//! Reads input images from disk and checks they are decodable.

use crate::error::{RemixError, Result};
use crate::image::types::{ImageFormat, ImageRef};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Loads one image file.
///
/// Fails with [`RemixError::NotFound`] if the path does not exist and with
/// [`RemixError::UnsupportedFormat`] if the bytes are not a PNG, JPEG or WebP
/// image that decodes cleanly.
pub fn load_image(path: impl AsRef<Path>) -> Result<ImageRef> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RemixError::NotFound {
            path: path.to_path_buf(),
        },
        _ => RemixError::Io(e),
    })?;

    let image = load_bytes(path, data)?;
    tracing::debug!(
        path = %path.display(),
        format = %image.format(),
        size_bytes = image.data().len(),
        "loaded image"
    );
    Ok(image)
}

/// Loads several image files, preserving order. Stops at the first failure.
pub fn load_images<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ImageRef>> {
    paths.iter().map(|path| load_image(path)).collect()
}

/// Validates in-memory bytes (e.g., an upload) under the given name.
pub fn load_bytes(name: impl Into<PathBuf>, data: Vec<u8>) -> Result<ImageRef> {
    let name = name.into();
    let format = ImageFormat::from_magic_bytes(&data).ok_or_else(|| {
        RemixError::UnsupportedFormat {
            path: name.clone(),
            reason: "not a PNG, JPEG or WebP image".into(),
        }
    })?;

    image::load_from_memory_with_format(&data, format.as_image_crate_format()).map_err(|e| {
        RemixError::UnsupportedFormat {
            path: name.clone(),
            reason: e.to_string(),
        }
    })?;

    Ok(ImageRef::new(name, data, format))
}
