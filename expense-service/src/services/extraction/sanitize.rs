//! Untrusted-to-trusted boundary for parsed invoice data.
//!
//! Model output (and heuristic output) arrives as an arbitrarily-shaped
//! JSON value. `sanitize` coerces it into a fully-typed [`InvoiceDraft`]
//! and never fails: every missing or malformed field gets a default. This
//! is the single place where defaults are decided.

use crate::models::{InvoiceDraft, LineItem};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Vendor name substituted when the source yields none.
pub const DEFAULT_VENDOR: &str = "Unknown Vendor";

/// Description used for the synthetic line item when none were extracted.
pub const SYNTHETIC_ITEM_DESCRIPTION: &str = "Service/Product";

/// Coerce an untrusted JSON value into a fully-defaulted invoice draft.
///
/// `now` is the processing instant; it seeds the `INV-<unix-ms>` invoice
/// number placeholder and the today-fallback for the invoice date, and is
/// passed explicitly so the whole pass is deterministic under test.
pub fn sanitize(value: &Value, now: DateTime<Utc>) -> InvoiceDraft {
    let amount = coerce_number(value.get("amount"))
        .unwrap_or(0.0)
        .max(0.0);

    let invoice_number = coerce_string(value.get("invoiceNumber"))
        .unwrap_or_else(|| format!("INV-{}", now.timestamp_millis()));

    let vendor_name =
        coerce_string(value.get("vendorName")).unwrap_or_else(|| DEFAULT_VENDOR.to_string());

    let invoice_date = coerce_string(value.get("invoiceDate"))
        .and_then(|s| normalize_date(&s))
        .unwrap_or_else(|| now.date_naive());

    let due_date = coerce_string(value.get("dueDate")).and_then(|s| normalize_date(&s));

    let mut line_items = coerce_line_items(value.get("lineItems"));
    if line_items.is_empty() {
        line_items.push(LineItem {
            description: SYNTHETIC_ITEM_DESCRIPTION.to_string(),
            quantity: 1.0,
            unit_price: amount,
            total_price: amount,
        });
    }

    InvoiceDraft {
        invoice_number,
        vendor_name,
        vendor_address: coerce_string(value.get("vendorAddress")),
        amount,
        currency: coerce_currency(value.get("currency")),
        invoice_date,
        due_date,
        line_items,
        tax_amount: coerce_number(value.get("taxAmount")).filter(|n| *n >= 0.0),
        subtotal: coerce_number(value.get("subtotal")).filter(|n| *n >= 0.0),
        payment_terms: coerce_string(value.get("paymentTerms")),
    }
}

/// Non-empty trimmed string, or nothing.
fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Permissive numeric parsing: JSON numbers directly, strings with
/// currency symbols and thousands separators stripped.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

/// 3-letter uppercase currency code, defaulting to USD.
fn coerce_currency(value: Option<&Value>) -> String {
    coerce_string(value)
        .filter(|s| s.len() == 3 && s.chars().all(|c| c.is_ascii_alphabetic()))
        .map(|s| s.to_ascii_uppercase())
        .unwrap_or_else(|| "USD".to_string())
}

static MDY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})$").unwrap());
static YMD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[/-](\d{1,2})[/-](\d{1,2})$").unwrap());

/// Normalize a date string to a calendar date.
///
/// ISO input parses directly. Otherwise two positional patterns are tried
/// in order: `D/D/Y` read month-first per US convention (`04-05-2024` is
/// April 5th, a documented ambiguity) and `Y/M/D`. Two-digit years are
/// promoted to 2000+YY. Impossible calendar dates are rejected; the
/// function never fails, it just finds no date.
pub fn normalize_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    if let Some(caps) = MDY_PATTERN.captures(s) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        let mut year: i32 = caps[3].parse().ok()?;
        if caps[3].len() == 2 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = YMD_PATTERN.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn coerce_line_items(value: Option<&Value>) -> Vec<LineItem> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let description = coerce_string(obj.get("description"))
                .unwrap_or_else(|| SYNTHETIC_ITEM_DESCRIPTION.to_string());
            let quantity = coerce_number(obj.get("quantity"))
                .filter(|q| *q > 0.0)
                .unwrap_or(1.0);
            let unit_price = coerce_number(obj.get("unitPrice")).unwrap_or(0.0).max(0.0);
            let total_price = coerce_number(obj.get("totalPrice"))
                .unwrap_or(quantity * unit_price)
                .max(0.0);
            Some(LineItem {
                description,
                quantity,
                unit_price,
                total_price,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_object_gets_full_defaults() {
        let draft = sanitize(&json!({}), fixed_now());

        assert_eq!(draft.invoice_number, format!("INV-{}", fixed_now().timestamp_millis()));
        assert_eq!(draft.vendor_name, DEFAULT_VENDOR);
        assert_eq!(draft.amount, 0.0);
        assert_eq!(draft.currency, "USD");
        assert_eq!(draft.invoice_date, fixed_now().date_naive());
        assert_eq!(draft.due_date, None);
        assert_eq!(draft.line_items.len(), 1);
        assert_eq!(draft.line_items[0].description, SYNTHETIC_ITEM_DESCRIPTION);
    }

    #[test]
    fn amount_parses_currency_formatted_strings() {
        let draft = sanitize(&json!({ "amount": "$1,250.00" }), fixed_now());
        assert_eq!(draft.amount, 1250.0);

        let draft = sanitize(&json!({ "amount": "not a number" }), fixed_now());
        assert_eq!(draft.amount, 0.0);

        let draft = sanitize(&json!({ "amount": -42.0 }), fixed_now());
        assert_eq!(draft.amount, 0.0);
    }

    #[test]
    fn synthetic_item_mirrors_total() {
        let draft = sanitize(&json!({ "amount": 500.0, "lineItems": [] }), fixed_now());
        assert_eq!(draft.line_items.len(), 1);
        assert_eq!(draft.line_items[0].quantity, 1.0);
        assert_eq!(draft.line_items[0].unit_price, 500.0);
        assert_eq!(draft.line_items[0].total_price, 500.0);
    }

    #[test]
    fn malformed_line_items_are_defaulted_per_field() {
        let draft = sanitize(
            &json!({
                "lineItems": [
                    { "description": "Widget", "quantity": "2", "unitPrice": "$10.00" },
                    { "quantity": -3 },
                    "not an object"
                ]
            }),
            fixed_now(),
        );

        assert_eq!(draft.line_items.len(), 2);
        assert_eq!(draft.line_items[0].description, "Widget");
        assert_eq!(draft.line_items[0].quantity, 2.0);
        assert_eq!(draft.line_items[0].unit_price, 10.0);
        assert_eq!(draft.line_items[0].total_price, 20.0);
        assert_eq!(draft.line_items[1].quantity, 1.0);
    }

    #[test]
    fn currency_is_normalized_or_defaulted() {
        let draft = sanitize(&json!({ "currency": "eur" }), fixed_now());
        assert_eq!(draft.currency, "EUR");

        let draft = sanitize(&json!({ "currency": "dollars" }), fixed_now());
        assert_eq!(draft.currency, "USD");
    }

    #[test]
    fn sanitization_is_idempotent() {
        let messy = json!({
            "invoiceNumber": "  INV-77  ",
            "vendorName": "Acme Corp",
            "amount": "$3,000",
            "currency": "usd",
            "invoiceDate": "03/15/2024",
            "dueDate": "13/40/2024",
            "taxAmount": -5,
            "lineItems": [{ "description": "Consulting", "quantity": 0 }]
        });

        let first = sanitize(&messy, fixed_now());
        let second = sanitize(&serde_json::to_value(&first).unwrap(), fixed_now());
        assert_eq!(first, second);
    }

    #[test]
    fn iso_dates_parse_directly() {
        assert_eq!(
            normalize_date("2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn slash_dates_are_month_first() {
        // Documented US-convention ambiguity: the first group is the month.
        assert_eq!(
            normalize_date("03/15/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(
            normalize_date("04-05-2024"),
            NaiveDate::from_ymd_opt(2024, 4, 5)
        );
    }

    #[test]
    fn two_digit_years_promote_to_2000s() {
        assert_eq!(
            normalize_date("1/2/24"),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
    }

    #[test]
    fn year_first_dates_parse() {
        assert_eq!(
            normalize_date("2024/03/15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
    }

    #[test]
    fn impossible_calendar_dates_are_rejected() {
        assert_eq!(normalize_date("13/45/2024"), None);
        assert_eq!(normalize_date("2024-13-15"), None);
        assert_eq!(normalize_date("2/30/2024"), None);
        assert_eq!(normalize_date("no date here"), None);
    }
}
