//! In-memory model used by unit tests.

use crate::error::{RemixError, Result};
use crate::image::{
    GeneratedImage, GenerationMetadata, GenerationResult, ImageFormat, ImageRef, RemixModel,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Writes a small real PNG to `path`.
pub(crate) fn write_png(path: &Path) {
    image::RgbImage::from_pixel(4, 4, image::Rgb([30, 90, 160]))
        .save(path)
        .unwrap();
}

/// Encodes a small real PNG in memory.
pub(crate) fn png_bytes() -> Vec<u8> {
    let mut data = Vec::new();
    image::RgbImage::from_pixel(2, 2, image::Rgb([250, 200, 0]))
        .write_to(&mut Cursor::new(&mut data), image::ImageFormat::Png)
        .unwrap();
    data
}

/// A recorded `remix` call.
#[derive(Debug, Clone)]
pub(crate) struct RemixCall {
    pub paths: Vec<PathBuf>,
    pub prompt: String,
}

/// Fake model returning one PNG per remix call and a fixed style summary.
#[derive(Debug, Default)]
pub(crate) struct FakeModel {
    remix_calls: Mutex<Vec<RemixCall>>,
    describe_calls: Mutex<Vec<Vec<PathBuf>>>,
    failing_stems: HashSet<String>,
    images_per_call: usize,
    summary: String,
}

impl FakeModel {
    pub fn new() -> Self {
        Self {
            images_per_call: 1,
            summary: "- Bold serif type\n- Warm sepia palette".to_string(),
            ..Default::default()
        }
    }

    /// Makes any remix call containing an image with this stem fail with an API error.
    pub fn failing_on(mut self, stem: &str) -> Self {
        self.failing_stems.insert(stem.to_string());
        self
    }

    pub fn images_per_call(mut self, count: usize) -> Self {
        self.images_per_call = count;
        self
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    pub fn remix_calls(&self) -> Vec<RemixCall> {
        self.remix_calls.lock().unwrap().clone()
    }

    pub fn describe_calls(&self) -> Vec<Vec<PathBuf>> {
        self.describe_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemixModel for FakeModel {
    async fn remix(&self, images: &[ImageRef], prompt: &str) -> Result<GenerationResult> {
        self.remix_calls.lock().unwrap().push(RemixCall {
            paths: images.iter().map(|i| i.path().to_path_buf()).collect(),
            prompt: prompt.to_string(),
        });

        if images.iter().any(|i| self.failing_stems.contains(&i.stem())) {
            return Err(RemixError::Api {
                status: 500,
                message: "backend unavailable".into(),
            });
        }
        if self.images_per_call == 0 {
            return Err(RemixError::EmptyResponse(
                "No image data in response".into(),
            ));
        }

        Ok(GenerationResult {
            images: (0..self.images_per_call)
                .map(|_| GeneratedImage::new(png_bytes(), ImageFormat::Png))
                .collect(),
            texts: vec!["Done.".to_string()],
            metadata: GenerationMetadata {
                model: Some("fake".to_string()),
                duration_ms: Some(1),
            },
        })
    }

    async fn describe(&self, images: &[ImageRef], _instruction: &str) -> Result<String> {
        self.describe_calls
            .lock()
            .unwrap()
            .push(images.iter().map(|i| i.path().to_path_buf()).collect());
        Ok(self.summary.clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}
