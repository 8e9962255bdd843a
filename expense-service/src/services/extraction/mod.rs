//! Invoice extraction pipeline.
//!
//! Loader -> text acquisition -> structured parse -> sanitize, with a
//! deterministic heuristic fallback when the model's JSON does not parse.
//! Recoverable conditions (malformed JSON, missing fields) are absorbed
//! here and signalled only through the confidence score; unsupported input
//! and upstream provider failures are fatal and surface to the caller.

pub mod acquire;
pub mod confidence;
pub mod heuristic;
pub mod parse;
pub mod sanitize;

use crate::models::{ExtractionMethod, ExtractionResult};
use crate::services::metrics::{EXTRACTIONS_TOTAL, EXTRACTION_CONFIDENCE};
use crate::services::providers::{ProviderError, VisionModelProvider};
use chrono::Utc;
use parse::StructuredOutcome;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Media types the loader accepts.
const SUPPORTED_IMAGE_PREFIX: &str = "image/";
const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Fatal pipeline errors. Everything recoverable is handled internally.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Model provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// One pipeline instance per application; each run owns its own buffers,
/// so concurrent uploads need no coordination.
pub struct ExtractionPipeline {
    provider: Arc<dyn VisionModelProvider>,
}

impl ExtractionPipeline {
    pub fn new(provider: Arc<dyn VisionModelProvider>) -> Self {
        Self { provider }
    }

    /// Run the full pipeline on an uploaded document.
    #[instrument(skip(self, data), fields(file_name = %file_name, media_type = %media_type, size = data.len()))]
    pub async fn process(
        &self,
        data: &[u8],
        file_name: &str,
        media_type: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        let (raw_text, method) = self.acquire_text(data, media_type).await?;
        self.process_text(raw_text, method, file_name).await
    }

    /// Loader decision plus text acquisition (spec'd media types only).
    async fn acquire_text(
        &self,
        data: &[u8],
        media_type: &str,
    ) -> Result<(String, ExtractionMethod), ExtractionError> {
        if media_type == PDF_MEDIA_TYPE {
            match acquire::pdf_text(data) {
                Ok(text) => return Ok((text, ExtractionMethod::PdfText)),
                Err(e) => {
                    // Graceful degradation: corrupt/encrypted/scanned PDFs
                    // go through the vision path with the same bytes.
                    tracing::warn!(error = %e, "PDF text extraction failed, falling back to vision path");
                    return Ok(acquire::transcribe(self.provider.as_ref(), media_type, data).await?);
                }
            }
        }

        if media_type.starts_with(SUPPORTED_IMAGE_PREFIX) {
            return Ok(acquire::transcribe(self.provider.as_ref(), media_type, data).await?);
        }

        Err(ExtractionError::UnsupportedMediaType(media_type.to_string()))
    }

    /// Structured parse with heuristic fallback, then sanitize and score.
    /// Never fails once text is acquired, except on a fatal provider error.
    pub async fn process_text(
        &self,
        raw_text: String,
        method: ExtractionMethod,
        file_name: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        let now = Utc::now();

        let extracted = match parse::parse_structured(self.provider.as_ref(), &raw_text).await? {
            StructuredOutcome::Parsed(value) => {
                EXTRACTIONS_TOTAL
                    .with_label_values(&[method.as_str(), "structured"])
                    .inc();
                sanitize::sanitize(&value, now)
            }
            StructuredOutcome::Unparseable { response, error } => {
                tracing::warn!(
                    error = %error,
                    response_len = response.len(),
                    "Model response was not valid JSON, using heuristic parser"
                );
                EXTRACTIONS_TOTAL
                    .with_label_values(&[method.as_str(), "fallback"])
                    .inc();
                let value = heuristic::parse(&raw_text, file_name);
                sanitize::sanitize(&value, now)
            }
        };

        let confidence = confidence::score(&extracted, &raw_text, method);
        EXTRACTION_CONFIDENCE.observe(confidence);

        tracing::info!(
            invoice_number = %extracted.invoice_number,
            vendor = %extracted.vendor_name,
            amount = extracted.amount,
            confidence = confidence,
            method = method.as_str(),
            "Extraction completed"
        );

        Ok(ExtractionResult {
            extracted,
            confidence,
            raw_text,
            method,
        })
    }
}
