//! Deterministic regex fallback extractor.
//!
//! Used only when the model's JSON response fails to parse. Each field has
//! an ordered list of pure pattern matchers tried in priority order until
//! one succeeds; no model calls, no randomness. The output is a permissive
//! JSON value handed to the sanitizer, which owns all defaulting.

use super::sanitize::normalize_date;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};

/// Parse raw document text into a best-effort invoice value.
pub fn parse(raw_text: &str, file_name: &str) -> Value {
    let amount = find_amount(raw_text);
    let line_items = find_line_items(raw_text);

    json!({
        "invoiceNumber": find_invoice_number(raw_text),
        "vendorName": find_vendor_name(raw_text)
            .unwrap_or_else(|| vendor_from_file_name(file_name)),
        "amount": amount,
        "invoiceDate": find_invoice_date(raw_text).map(|d| d.to_string()),
        "dueDate": find_due_date(raw_text).map(|d| d.to_string()),
        "lineItems": line_items,
    })
}

// Invoice numbers must contain a digit, which keeps label words like
// "Date" in "Invoice Date:" from being captured (the regex crate has no
// lookahead, so the constraint lives in the capture class).
static INVOICE_NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\binvoice\s*(?:number|num|no)?\s*[.:#]*\s*([A-Za-z-]*\d[A-Za-z0-9-]*)")
            .unwrap(),
        Regex::new(r"(?i)\b(?:inv|bill|receipt)\s*(?:number|num|no)?\s*[.:#]*\s*([A-Za-z-]*\d[A-Za-z0-9-]*)")
            .unwrap(),
        Regex::new(r"(?i)\b(?:number|no)\s*[.:#]+\s*([A-Za-z-]*\d[A-Za-z0-9-]*)").unwrap(),
        // Bare reference shape: two-plus letters, hyphen, digits.
        Regex::new(r"\b([A-Z]{2,}-\d+)\b").unwrap(),
    ]
});

fn find_invoice_number(text: &str) -> Option<String> {
    INVOICE_NUMBER_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .map(|caps| caps[1].to_string())
}

static AMOUNT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bgrand\s+total\s*:?\s*\$?\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)").unwrap(),
        Regex::new(r"(?i)\b(?:total\s+)?amount\s+due\s*:?\s*\$?\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)")
            .unwrap(),
        Regex::new(r"(?i)\bbalance\s+due\s*:?\s*\$?\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)").unwrap(),
        Regex::new(r"(?i)\btotal\s*:?\s*\$?\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)").unwrap(),
    ]
});

fn find_amount(text: &str) -> Option<f64> {
    AMOUNT_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok())
}

static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}[/-]\d{1,2}[/-]\d{1,2}").unwrap()
});
static DATE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bdate\b").unwrap());
static DUE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bdue\b").unwrap());

fn find_invoice_date(text: &str) -> Option<chrono::NaiveDate> {
    text.lines()
        .filter(|line| DATE_LABEL.is_match(line) && !DUE_LABEL.is_match(line))
        .find_map(|line| DATE_TOKEN.find(line))
        .and_then(|token| normalize_date(token.as_str()))
}

fn find_due_date(text: &str) -> Option<chrono::NaiveDate> {
    text.lines()
        .filter(|line| DUE_LABEL.is_match(line))
        .find_map(|line| DATE_TOKEN.find(line))
        .and_then(|token| normalize_date(token.as_str()))
}

// Proper-case company name shape: capitalized words, optional corporate
// suffix, no digits.
static VENDOR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Z][A-Za-z&.'-]*(?:\s+[A-Za-z&.'-]+)*?,?\s*(?:Inc|LLC|Corp|Ltd|Co|Company|GmbH)?\.?$",
    )
    .unwrap()
});

// Document keywords that look like proper-case lines but never name the
// vendor.
const VENDOR_STOPWORDS: &[&str] = &[
    "invoice", "receipt", "bill", "statement", "estimate", "quote", "date", "total", "subtotal",
    "tax", "amount", "due", "balance", "description", "quantity", "payment",
];

fn find_vendor_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(8)
        .find(|line| {
            if line.chars().any(|c| c.is_ascii_digit()) {
                return false;
            }
            if line.split_whitespace().count() > 6 {
                return false;
            }
            let first_word = line
                .split_whitespace()
                .next()
                .unwrap_or("")
                .trim_end_matches([':', '#'])
                .to_ascii_lowercase();
            if VENDOR_STOPWORDS.contains(&first_word.as_str()) {
                return false;
            }
            VENDOR_LINE.is_match(line)
        })
        .map(str::to_string)
}

/// Derive a vendor name from the file name: extension stripped, separators
/// replaced with spaces, each word title-cased.
fn vendor_from_file_name(file_name: &str) -> String {
    let stem = std::path::Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    stem.replace(['_', '-'], " ")
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

// Line-item shapes, in fixed priority order per line:
//   1. description  qty  unit-price  total
//   2. description  price            (quantity defaults to 1)
//   3. qty  description  unit-price  total
static ITEM_DESC_QTY_UNIT_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([A-Za-z].*?)\s+(\d+(?:\.\d+)?)\s+\$?([\d,]+(?:\.\d{1,2})?)\s+\$?([\d,]+(?:\.\d{1,2})?)\s*$",
    )
    .unwrap()
});
static ITEM_DESC_PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z].*?)\s+\$?([\d,]+\.\d{2})\s*$").unwrap());
static ITEM_QTY_DESC_UNIT_TOTAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d+(?:\.\d+)?)\s+([A-Za-z].*?)\s+\$?([\d,]+(?:\.\d{1,2})?)\s+\$?([\d,]+(?:\.\d{1,2})?)\s*$",
    )
    .unwrap()
});

// Summary lines: a totals-style label, optionally followed by a single
// amount and nothing else. These would otherwise match the
// description+price shape and surface as bogus items. A label word
// appearing inside a real description ("Tax consulting 2 100.00 200.00")
// does not make the line a summary.
static ITEM_SUMMARY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:grand\s+total|subtotal|total|tax|balance\s+due|amount\s+due)\s*:?\s*\$?[\d,]*(?:\.\d{1,2})?\s*$",
    )
    .unwrap()
});

fn parse_money(s: &str) -> Option<f64> {
    s.replace(',', "").parse::<f64>().ok()
}

fn find_line_items(text: &str) -> Vec<Value> {
    let mut items = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || ITEM_SUMMARY_LINE.is_match(line) {
            continue;
        }

        if let Some(caps) = ITEM_DESC_QTY_UNIT_TOTAL.captures(line) {
            if let (Some(quantity), Some(unit), Some(total)) = (
                caps[2].parse::<f64>().ok(),
                parse_money(&caps[3]),
                parse_money(&caps[4]),
            ) {
                items.push(json!({
                    "description": caps[1].trim(),
                    "quantity": quantity,
                    "unitPrice": unit,
                    "totalPrice": total,
                }));
                continue;
            }
        }

        if let Some(caps) = ITEM_DESC_PRICE.captures(line) {
            if let Some(price) = parse_money(&caps[2]) {
                items.push(json!({
                    "description": caps[1].trim(),
                    "quantity": 1.0,
                    "unitPrice": price,
                    "totalPrice": price,
                }));
                continue;
            }
        }

        if let Some(caps) = ITEM_QTY_DESC_UNIT_TOTAL.captures(line) {
            if let (Some(quantity), Some(unit), Some(total)) = (
                caps[1].parse::<f64>().ok(),
                parse_money(&caps[3]),
                parse_money(&caps[4]),
            ) {
                items.push(json!({
                    "description": caps[2].trim(),
                    "quantity": quantity,
                    "unitPrice": unit,
                    "totalPrice": total,
                }));
            }
        }
        // Lines matching no shape are silently skipped.
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Acme Corp\n\
        123 Main Street\n\
        Invoice #INV-1009\n\
        Date: 03/15/2024\n\
        Due Date: 04/15/2024\n\
        \n\
        Consulting services 2 500.00 1000.00\n\
        Travel reimbursement 250.00\n\
        \n\
        Subtotal: $1,250.00\n\
        Total: $1,250.00\n";

    #[test]
    fn extracts_labeled_invoice_number() {
        let parsed = parse(SAMPLE, "scan.pdf");
        assert_eq!(parsed["invoiceNumber"], "INV-1009");
    }

    #[test]
    fn extracts_total_with_commas_stripped() {
        let parsed = parse(SAMPLE, "scan.pdf");
        assert_eq!(parsed["amount"], 1250.0);
    }

    #[test]
    fn extracts_month_first_dates() {
        let parsed = parse(SAMPLE, "scan.pdf");
        assert_eq!(parsed["invoiceDate"], "2024-03-15");
        assert_eq!(parsed["dueDate"], "2024-04-15");
    }

    #[test]
    fn vendor_comes_from_leading_proper_case_line() {
        let parsed = parse(SAMPLE, "scan.pdf");
        assert_eq!(parsed["vendorName"], "Acme Corp");
    }

    #[test]
    fn vendor_falls_back_to_title_cased_file_name() {
        let parsed = parse("no vendor lines here\n12345\n", "acme_corp_invoice.pdf");
        assert_eq!(parsed["vendorName"], "Acme Corp Invoice");
    }

    #[test]
    fn line_item_shapes_are_tried_in_order() {
        let parsed = parse(SAMPLE, "scan.pdf");
        let items = parsed["lineItems"].as_array().unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0]["description"], "Consulting services");
        assert_eq!(items[0]["quantity"], 2.0);
        assert_eq!(items[0]["unitPrice"], 500.0);
        assert_eq!(items[0]["totalPrice"], 1000.0);

        assert_eq!(items[1]["description"], "Travel reimbursement");
        assert_eq!(items[1]["quantity"], 1.0);
        assert_eq!(items[1]["totalPrice"], 250.0);
    }

    #[test]
    fn summary_label_inside_a_description_is_still_an_item() {
        let parsed = parse("Tax consulting 2 100.00 200.00\n", "x.pdf");
        let items = parsed["lineItems"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["description"], "Tax consulting");
        assert_eq!(items[0]["quantity"], 2.0);
        assert_eq!(items[0]["totalPrice"], 200.0);
    }

    #[test]
    fn bare_summary_lines_are_not_items() {
        let parsed = parse("Tax: 100.00\nSubtotal: $1,150.00\nGrand Total: $1,250.00\n", "x.pdf");
        assert!(parsed["lineItems"].as_array().unwrap().is_empty());
    }

    #[test]
    fn qty_first_item_shape_matches() {
        let parsed = parse("3 Widgets 10 30\n", "x.pdf");
        let items = parsed["lineItems"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["description"], "Widgets");
        assert_eq!(items[0]["quantity"], 3.0);
        assert_eq!(items[0]["unitPrice"], 10.0);
        assert_eq!(items[0]["totalPrice"], 30.0);
    }

    #[test]
    fn bare_reference_shape_is_last_resort() {
        let parsed = parse("Reference AB-4471 attached\n", "x.pdf");
        assert_eq!(parsed["invoiceNumber"], "AB-4471");
    }

    #[test]
    fn missing_fields_yield_nulls() {
        let parsed = parse("nothing useful at all\n", "x.pdf");
        assert!(parsed["invoiceNumber"].is_null());
        assert!(parsed["amount"].is_null());
        assert!(parsed["invoiceDate"].is_null());
        assert!(parsed["lineItems"].as_array().unwrap().is_empty());
    }

    #[test]
    fn output_is_deterministic() {
        let first = parse(SAMPLE, "scan.pdf");
        let second = parse(SAMPLE, "scan.pdf");
        assert_eq!(first, second);
    }
}
