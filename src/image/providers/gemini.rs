//! Gemini (Google) image model client.

use crate::error::{parse_retry_after, sanitize_error_message, RemixError, Result};
use crate::image::provider::RemixModel;
use crate::image::types::{
    GeneratedImage, GenerationMetadata, GenerationResult, ImageFormat, ImageRef,
};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default endpoint of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables checked for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

impl std::str::FromStr for GeminiModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nano-banana" | "gemini-2.5-flash-image" => Ok(Self::NanoBanana),
            "nano-banana-pro" | "nano-banana-pro-preview" => Ok(Self::NanoBananaPro),
            other => Err(format!(
                "unknown model '{}' (expected nano-banana or nano-banana-pro)",
                other
            )),
        }
    }
}

/// Resolves the API key from an explicit value or the environment.
///
/// Empty values count as unset. Returns [`RemixError::Config`] when nothing is found.
pub fn resolve_api_key(explicit: Option<String>) -> Result<String> {
    resolve_api_key_with(explicit, |name| std::env::var(name).ok())
}

pub(crate) fn resolve_api_key_with(
    explicit: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    explicit
        .into_iter()
        .chain(API_KEY_ENV_VARS.iter().filter_map(|name| lookup(name)))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or_else(|| {
            RemixError::Config(format!(
                "{} or {} environment variable not set",
                API_KEY_ENV_VARS[0], API_KEY_ENV_VARS[1]
            ))
        })
}

/// Builder for GeminiClient.
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL (e.g., for a proxy).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = resolve_api_key(self.api_key)?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiClient {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url,
        })
    }
}

/// Gemini remix client.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    /// Model variant used by this client.
    pub fn model(&self) -> GeminiModel {
        self.model
    }

    async fn generate_content(&self, body: &GeminiRequest) -> Result<GeminiResponse> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        tracing::debug!(
            model = self.model.as_str(),
            parts = body.contents[0].parts.len(),
            "submitting Gemini request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RemixModel for GeminiClient {
    async fn remix(&self, images: &[ImageRef], prompt: &str) -> Result<GenerationResult> {
        let start = Instant::now();
        let body = GeminiRequest::new(images, prompt, &["IMAGE", "TEXT"]);
        let response = self.generate_content(&body).await?;

        let mut result = parse_generation(response)?;
        result.metadata = GenerationMetadata {
            model: Some(self.model.as_str().to_string()),
            duration_ms: Some(start.elapsed().as_millis() as u64),
        };
        tracing::debug!(
            images = result.images.len(),
            texts = result.texts.len(),
            duration_ms = ?result.metadata.duration_ms,
            "Gemini remix complete"
        );
        Ok(result)
    }

    async fn describe(&self, images: &[ImageRef], instruction: &str) -> Result<String> {
        let body = GeminiRequest::new(images, instruction, &["TEXT"]);
        let response = self.generate_content(&body).await?;
        parse_description(response)
    }

    fn name(&self) -> &str {
        self.model.as_str()
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> RemixError {
    let text = sanitize_error_message(text);
    let lower = text.to_lowercase();
    if status == 404 {
        return RemixError::Api {
            status,
            message: "Model not found. Verify the model name is correct.".into(),
        };
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return RemixError::RateLimited { retry_after };
    }
    // Gemini reports a bad key as 400 INVALID_ARGUMENT.
    if status == 401 || status == 403 || (status == 400 && lower.contains("api key not valid")) {
        return RemixError::Auth(text);
    }
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return RemixError::ContentBlocked(text);
    }
    RemixError::Api {
        status,
        message: text,
    }
}

/// Unwraps the first candidate, turning block signals into errors.
fn first_content(response: GeminiResponse) -> Result<GeminiContentResponse> {
    // Prompt blocks come back as HTTP 200
    if let Some(ref feedback) = response.prompt_feedback {
        if let Some(ref reason) = feedback.block_reason {
            let msg = feedback
                .block_reason_message
                .clone()
                .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
            return Err(RemixError::ContentBlocked(msg));
        }
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| RemixError::EmptyResponse("No candidates in Gemini response".into()))?;

    if let Some(ref finish_reason) = candidate.finish_reason {
        match finish_reason.as_str() {
            "SAFETY"
            | "IMAGE_SAFETY"
            | "IMAGE_PROHIBITED_CONTENT"
            | "IMAGE_RECITATION"
            | "RECITATION"
            | "PROHIBITED_CONTENT"
            | "BLOCKLIST" => {
                return Err(RemixError::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {}",
                    finish_reason
                )));
            }
            "IMAGE_OTHER" | "NO_IMAGE" => {
                return Err(RemixError::EmptyResponse(format!(
                    "Generation failed: {}. Try a different prompt.",
                    finish_reason
                )));
            }
            _ => {}
        }
    }

    candidate
        .content
        .ok_or_else(|| RemixError::EmptyResponse("No content in Gemini candidate".into()))
}

fn parse_generation(response: GeminiResponse) -> Result<GenerationResult> {
    let content = first_content(response)?;
    let mut result = GenerationResult::default();

    for part in content.parts.into_iter().filter(|p| !p.thought) {
        if let Some(inline) = part.inline_data {
            let data = base64::engine::general_purpose::STANDARD
                .decode(&inline.data)
                .map_err(|e| RemixError::Decode(e.to_string()))?;
            if data.is_empty() {
                continue;
            }
            let claimed = ImageFormat::from_mime_type(&inline.mime_type);
            result.images.push(GeneratedImage::from_bytes(data, claimed)?);
        } else if let Some(text) = part.text {
            let text = text.trim();
            if !text.is_empty() {
                result.texts.push(text.to_string());
            }
        }
    }

    if result.is_empty() {
        return Err(RemixError::EmptyResponse(
            "No image data in Gemini response".into(),
        ));
    }
    Ok(result)
}

fn parse_description(response: GeminiResponse) -> Result<String> {
    let content = first_content(response)?;
    let description = content
        .parts
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if description.is_empty() {
        return Err(RemixError::EmptyResponse(
            "Received an empty style description".into(),
        ));
    }
    Ok(description)
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    /// Images first, in order, then the instruction text.
    fn new(images: &[ImageRef], text: &str, modalities: &[&str]) -> Self {
        let mut parts: Vec<GeminiRequestPart> = images
            .iter()
            .map(|image| GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: image.mime_type().to_string(),
                    data: base64::engine::general_purpose::STANDARD.encode(image.data()),
                },
            })
            .collect();

        parts.push(GeminiRequestPart::Text {
            text: text.to_string(),
        });

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: modalities.iter().map(|m| m.to_string()).collect(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}
