//! Mock provider for testing.

use super::{ProviderError, VisionModelProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock provider returning canned responses. Unset responses fail with
/// `NotConfigured`, which doubles as the upstream-failure case in tests.
/// Call counts are tracked so tests can assert the model was (not) hit.
#[derive(Default)]
pub struct MockProvider {
    transcription: Option<String>,
    completion: Option<String>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcription(mut self, text: impl Into<String>) -> Self {
        self.transcription = Some(text.into());
        self
    }

    pub fn with_completion(mut self, text: impl Into<String>) -> Self {
        self.completion = Some(text.into());
        self
    }

    /// Number of model calls issued so far (transcriptions + completions).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionModelProvider for MockProvider {
    async fn transcribe_document(
        &self,
        _mime_type: &str,
        _data: &[u8],
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcription.clone().ok_or_else(|| {
            ProviderError::NotConfigured("Mock transcription not configured".to_string())
        })
    }

    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.completion.clone().ok_or_else(|| {
            ProviderError::NotConfigured("Mock completion not configured".to_string())
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
