//! Hosted model provider abstraction.
//!
//! The extraction pipeline talks to a multimodal model through this trait
//! so the Gemini backend can be swapped for a mock in tests.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// Multimodal provider used by the extraction pipeline: document
/// transcription (OCR/vision path) and plain text completion (structured
/// field extraction).
#[async_trait]
pub trait VisionModelProvider: Send + Sync {
    /// Transcribe all visible text in a document, preserving layout.
    /// The bytes are sent inline (base64) with the given MIME type.
    async fn transcribe_document(
        &self,
        mime_type: &str,
        data: &[u8],
    ) -> Result<String, ProviderError>;

    /// Complete a text prompt and return the model's raw text response.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
