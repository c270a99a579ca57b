//! Error types for remixing and restyling.

use std::path::PathBuf;
use std::time::Duration;

/// Maximum length of a remote error body kept in an error message.
const MAX_ERROR_BODY: usize = 500;

/// Errors that can occur while loading, generating or writing images.
#[derive(Debug, thiserror::Error)]
pub enum RemixError {
    /// Credentials missing at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input image path does not exist.
    #[error("image not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Input file is not a decodable image in a supported format.
    #[error("unsupported image format for {}: {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// Invalid request parameters (image counts, etc).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API key rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Quota or rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to decode base64 data from the model.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// The model answered without the requested output.
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// Failed to persist an output file.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Other I/O error (reading an input, or the operator console).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemixError {
    /// Returns true for failures of the remote model call.
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Api { .. }
                | Self::RateLimited { .. }
                | Self::ContentBlocked(_)
                | Self::Network(_)
                | Self::Json(_)
                | Self::Decode(_)
        )
    }

    /// Returns true if this error must stop a batch instead of skipping one photo.
    pub fn aborts_batch(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::Config(_))
    }
}

/// Result type alias for remix operations.
pub type Result<T> = std::result::Result<T, RemixError>;

/// Trims a remote error body and caps its length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(MAX_ERROR_BODY).collect();
    truncated.push_str("...");
    truncated
}

/// Parses a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
