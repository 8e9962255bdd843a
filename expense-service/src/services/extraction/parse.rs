//! Structured field extraction via the hosted model.
//!
//! One completion request embeds the raw document text and a strict JSON
//! schema. The response is untrusted: fences are stripped and the result
//! parsed as a plain `serde_json::Value` for the sanitizer. A malformed
//! response is not an error and is not retried; the caller falls back to
//! the heuristic parser instead.

use crate::services::providers::{ProviderError, VisionModelProvider};
use serde_json::Value;

/// Outcome of the structured parse: either a JSON value for the sanitizer
/// or the unusable model response (kept for logging).
pub enum StructuredOutcome {
    Parsed(Value),
    Unparseable {
        response: String,
        error: serde_json::Error,
    },
}

/// Issue the extraction request and parse the model's response.
///
/// Provider failures (network, quota) propagate as errors: they are fatal
/// for the pipeline invocation. Only a malformed JSON body is recoverable.
pub async fn parse_structured(
    provider: &dyn VisionModelProvider,
    raw_text: &str,
) -> Result<StructuredOutcome, ProviderError> {
    let prompt = build_prompt(raw_text);
    let response = provider.complete(&prompt).await?;

    let body = strip_code_fences(&response);
    match serde_json::from_str::<Value>(body) {
        Ok(value) => Ok(StructuredOutcome::Parsed(value)),
        Err(error) => Ok(StructuredOutcome::Unparseable { response, error }),
    }
}

fn build_prompt(raw_text: &str) -> String {
    format!(
        r#"Extract the invoice fields from the document text below.

Return ONLY a JSON object with exactly this shape, no prose and no Markdown:
{{
  "invoiceNumber": "string",
  "vendorName": "string",
  "vendorAddress": "string or null",
  "amount": 0.0,
  "currency": "3-letter code, e.g. USD",
  "invoiceDate": "YYYY-MM-DD",
  "dueDate": "YYYY-MM-DD or null",
  "lineItems": [
    {{ "description": "string", "quantity": 1, "unitPrice": 0.0, "totalPrice": 0.0 }}
  ],
  "taxAmount": 0.0,
  "subtotal": 0.0,
  "paymentTerms": "string or null"
}}

Amounts must be plain numbers without currency symbols or separators.
Dates must be in YYYY-MM-DD format. Use null for anything not present.

Document text:
{raw_text}"#
    )
}

/// Strip a Markdown code fence (```json ... ```) wrapping, if present.
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_passes_through() {
        assert_eq!(strip_code_fences(r#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn json_fence_is_stripped() {
        let fenced = "```json\n{\"amount\": 10}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"amount\": 10}");
    }

    #[test]
    fn anonymous_fence_is_stripped() {
        let fenced = "```\n{\"amount\": 10}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"amount\": 10}");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let fenced = "  \n```json\n{}\n```  \n";
        assert_eq!(strip_code_fences(fenced), "{}");
    }

    #[test]
    fn prompt_embeds_document_text() {
        let prompt = build_prompt("Total: $42");
        assert!(prompt.contains("Total: $42"));
        assert!(prompt.contains("invoiceNumber"));
        assert!(prompt.contains("YYYY-MM-DD"));
    }
}
