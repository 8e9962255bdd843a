//! Heuristic extraction confidence score.
//!
//! A deterministic function of the sanitized draft, the raw text, and the
//! acquisition method. Not a calibrated probability: the base reflects the
//! text source quality and each present field adds a small fixed bonus.

use super::sanitize::DEFAULT_VENDOR;
use crate::models::{ExtractionMethod, InvoiceDraft};

/// Score an extraction in [0, 1].
pub fn score(draft: &InvoiceDraft, raw_text: &str, method: ExtractionMethod) -> f64 {
    let mut score: f64 = match method {
        ExtractionMethod::PdfText => 0.85,
        ExtractionMethod::OcrImage => 0.75,
    };

    if !is_placeholder_number(&draft.invoice_number) {
        score += 0.08;
    }
    if draft.amount > 0.0 && draft.amount < 1_000_000.0 {
        score += 0.06;
    }
    if draft.vendor_name != DEFAULT_VENDOR {
        score += 0.08;
    }
    if raw_text.chars().count() > 200 {
        score += 0.05;
    }
    if draft.due_date.is_some() {
        score += 0.03;
    }
    if draft.line_items.len() > 1 {
        score += 0.04;
    }
    if draft.vendor_address.is_some() {
        score += 0.03;
    }
    if draft.tax_amount.is_some() {
        score += 0.02;
    }

    score.clamp(0.0, 1.0)
}

/// The sanitizer's defaulted invoice number is `INV-<unix-ms>`: an `INV-`
/// prefix followed by a long run of digits. Real numbers like `INV-1009`
/// are much shorter.
pub fn is_placeholder_number(invoice_number: &str) -> bool {
    invoice_number
        .strip_prefix("INV-")
        .is_some_and(|rest| rest.len() >= 10 && rest.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use chrono::NaiveDate;

    fn minimal_draft() -> InvoiceDraft {
        InvoiceDraft {
            invoice_number: "INV-1717243200000".to_string(),
            vendor_name: DEFAULT_VENDOR.to_string(),
            vendor_address: None,
            amount: 0.0,
            currency: "USD".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            due_date: None,
            line_items: vec![LineItem {
                description: "Service/Product".to_string(),
                quantity: 1.0,
                unit_price: 0.0,
                total_price: 0.0,
            }],
            tax_amount: None,
            subtotal: None,
            payment_terms: None,
        }
    }

    fn rich_draft() -> InvoiceDraft {
        InvoiceDraft {
            invoice_number: "INV-1009".to_string(),
            vendor_name: "Acme Corp".to_string(),
            vendor_address: Some("123 Main Street".to_string()),
            amount: 1250.0,
            due_date: NaiveDate::from_ymd_opt(2024, 4, 15),
            line_items: vec![
                LineItem {
                    description: "Consulting".to_string(),
                    quantity: 2.0,
                    unit_price: 500.0,
                    total_price: 1000.0,
                },
                LineItem {
                    description: "Travel".to_string(),
                    quantity: 1.0,
                    unit_price: 250.0,
                    total_price: 250.0,
                },
            ],
            tax_amount: Some(100.0),
            ..minimal_draft()
        }
    }

    #[test]
    fn base_score_reflects_acquisition_method() {
        let draft = minimal_draft();
        assert_eq!(score(&draft, "short", ExtractionMethod::PdfText), 0.85);
        assert_eq!(score(&draft, "short", ExtractionMethod::OcrImage), 0.75);
    }

    #[test]
    fn bonuses_accumulate_independently() {
        let mut draft = minimal_draft();
        draft.invoice_number = "INV-1009".to_string();
        draft.amount = 100.0;

        // 0.75 base + 0.08 invoice number + 0.06 amount
        let s = score(&draft, "short", ExtractionMethod::OcrImage);
        assert!((s - 0.89).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn full_bonus_sum_caps_at_one() {
        let draft = rich_draft();
        let long_text = "x".repeat(500);

        assert_eq!(score(&draft, &long_text, ExtractionMethod::PdfText), 1.0);
        assert_eq!(score(&draft, &long_text, ExtractionMethod::OcrImage), 1.0);
    }

    #[test]
    fn missing_amount_forfeits_its_bonus() {
        let mut with_amount = minimal_draft();
        with_amount.amount = 250.0;
        let without_amount = minimal_draft();

        let with = score(&with_amount, "short", ExtractionMethod::OcrImage);
        let without = score(&without_amount, "short", ExtractionMethod::OcrImage);
        assert!((with - without - 0.06).abs() < 1e-9);
    }

    #[test]
    fn length_bonus_counts_characters_not_bytes() {
        let draft = minimal_draft();

        // 150 two-byte characters: 300 bytes but only 150 characters.
        let short_multibyte = "é".repeat(150);
        let s = score(&draft, &short_multibyte, ExtractionMethod::OcrImage);
        assert!((s - 0.75).abs() < 1e-9, "got {s}");

        let long_multibyte = "é".repeat(201);
        let s = score(&draft, &long_multibyte, ExtractionMethod::OcrImage);
        assert!((s - 0.80).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn unreasonably_large_amounts_do_not_count() {
        let mut draft = minimal_draft();
        draft.amount = 2_000_000.0;
        let capped = score(&draft, "short", ExtractionMethod::OcrImage);
        draft.amount = 500.0;
        let normal = score(&draft, "short", ExtractionMethod::OcrImage);
        assert!(normal > capped);
    }

    #[test]
    fn score_stays_in_bounds() {
        for method in [ExtractionMethod::PdfText, ExtractionMethod::OcrImage] {
            for draft in [minimal_draft(), rich_draft()] {
                for text in ["", &"y".repeat(10_000)] {
                    let s = score(&draft, text, method);
                    assert!((0.0..=1.0).contains(&s), "score {s} out of bounds");
                }
            }
        }
    }

    #[test]
    fn placeholder_detection() {
        assert!(is_placeholder_number("INV-1717243200000"));
        assert!(!is_placeholder_number("INV-1009"));
        assert!(!is_placeholder_number("A-1717243200000"));
        assert!(!is_placeholder_number("INV-17172432000ab"));
    }
}
