//! Raw text acquisition.
//!
//! PDFs go through native text extraction; images (and PDFs whose native
//! extraction fails) are transcribed by the multimodal model.

use crate::models::ExtractionMethod;
use crate::services::providers::{ProviderError, VisionModelProvider};

/// Deterministic native PDF text extraction. Byte-for-byte reproducible
/// for well-formed PDFs. An empty result counts as a failure so scanned
/// PDFs with no embedded text fall through to the vision path.
pub fn pdf_text(data: &[u8]) -> Result<String, anyhow::Error> {
    let text = pdf_extract::extract_text_from_mem(data)?;
    if text.trim().is_empty() {
        anyhow::bail!("PDF contains no extractable text");
    }
    Ok(text)
}

/// Vision path: send the document inline to the model and ask for a
/// verbatim transcription. Failure here is fatal for the pipeline
/// invocation and is not retried.
pub async fn transcribe(
    provider: &dyn VisionModelProvider,
    mime_type: &str,
    data: &[u8],
) -> Result<(String, ExtractionMethod), ProviderError> {
    let text = provider.transcribe_document(mime_type, data).await?;
    Ok((text, ExtractionMethod::OcrImage))
}
