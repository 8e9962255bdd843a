//! Invoice model for expense-service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Approved => "approved",
            InvoiceStatus::Rejected => "rejected",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "approved" => InvoiceStatus::Approved,
            "rejected" => InvoiceStatus::Rejected,
            "paid" => InvoiceStatus::Paid,
            _ => InvoiceStatus::Pending,
        }
    }

    /// Admin approval decision. Only valid from `Pending`; returns `None`
    /// for transitions out of terminal states.
    pub fn decide(self, approve: bool) -> Option<InvoiceStatus> {
        match self {
            InvoiceStatus::Pending if approve => Some(InvoiceStatus::Approved),
            InvoiceStatus::Pending => Some(InvoiceStatus::Rejected),
            _ => None,
        }
    }

    /// Payment completion. Only an approved invoice can be marked paid.
    pub fn mark_paid(self) -> Option<InvoiceStatus> {
        match self {
            InvoiceStatus::Approved => Some(InvoiceStatus::Paid),
            _ => None,
        }
    }
}

/// A single invoice line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
}

/// Fully-typed invoice draft produced by the extraction pipeline. Every
/// field is already sanitized: the draft is safe to persist or render
/// without further checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub invoice_number: String,
    pub vendor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_address: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub invoice_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub line_items: Vec<LineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
}

/// Persisted invoice row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub owner_id: String,
    pub invoice_number: String,
    pub vendor_name: String,
    pub vendor_address: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub line_items: serde_json::Value,
    pub tax_amount: Option<f64>,
    pub subtotal: Option<f64>,
    pub payment_terms: Option<String>,
    pub status: String,
    pub confidence: f64,
    pub extraction_method: String,
    pub raw_text: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: Option<DateTime<Utc>>,
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub owner_id: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub page: i64,
    pub page_size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decide_from_pending() {
        assert_eq!(
            InvoiceStatus::Pending.decide(true),
            Some(InvoiceStatus::Approved)
        );
        assert_eq!(
            InvoiceStatus::Pending.decide(false),
            Some(InvoiceStatus::Rejected)
        );
    }

    #[test]
    fn decide_from_terminal_states_is_rejected() {
        assert_eq!(InvoiceStatus::Approved.decide(true), None);
        assert_eq!(InvoiceStatus::Rejected.decide(false), None);
        assert_eq!(InvoiceStatus::Paid.decide(true), None);
    }

    #[test]
    fn only_approved_invoices_can_be_paid() {
        assert_eq!(
            InvoiceStatus::Approved.mark_paid(),
            Some(InvoiceStatus::Paid)
        );
        assert_eq!(InvoiceStatus::Pending.mark_paid(), None);
        assert_eq!(InvoiceStatus::Rejected.mark_paid(), None);
        assert_eq!(InvoiceStatus::Paid.mark_paid(), None);
    }

    #[test]
    fn status_string_round_trip() {
        for status in [
            InvoiceStatus::Pending,
            InvoiceStatus::Approved,
            InvoiceStatus::Rejected,
            InvoiceStatus::Paid,
        ] {
            assert_eq!(InvoiceStatus::from_string(status.as_str()), status);
        }
        assert_eq!(InvoiceStatus::from_string("garbage"), InvoiceStatus::Pending);
    }
}
