//! Remote model implementations.

mod gemini;

pub use gemini::{
    resolve_api_key, GeminiClient, GeminiClientBuilder, GeminiModel, API_KEY_ENV_VARS,
    DEFAULT_BASE_URL,
};
pub(crate) use gemini::resolve_api_key_with;
