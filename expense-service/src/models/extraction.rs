//! Transient extraction pipeline output.

use crate::models::invoice::InvoiceDraft;
use serde::{Deserialize, Serialize};

/// Provenance of the raw text the extraction ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    PdfText,
    OcrImage,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::PdfText => "pdf-text",
            ExtractionMethod::OcrImage => "ocr-image",
        }
    }
}

/// Result of one pipeline run. Not persisted directly; the caller writes
/// the draft plus confidence into the invoices table.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub extracted: InvoiceDraft,
    /// Heuristic quality signal in [0, 1]; not a calibrated probability.
    pub confidence: f64,
    pub raw_text: String,
    pub method: ExtractionMethod,
}
