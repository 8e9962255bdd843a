use crate::models::{Invoice, InvoiceDraft, InvoiceStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload returned by the upload endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadData {
    pub invoice_id: Uuid,
    pub extracted_data: InvoiceDraft,
    pub confidence: f64,
    pub method: String,
}

/// Full invoice representation returned by read endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub invoice_id: Uuid,
    pub owner_id: String,
    pub invoice_number: String,
    pub vendor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_address: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub invoice_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub line_items: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    pub status: String,
    pub confidence: f64,
    pub extraction_method: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(inv: Invoice) -> Self {
        Self {
            invoice_id: inv.invoice_id,
            owner_id: inv.owner_id,
            invoice_number: inv.invoice_number,
            vendor_name: inv.vendor_name,
            vendor_address: inv.vendor_address,
            amount: inv.amount,
            currency: inv.currency,
            invoice_date: inv.invoice_date.to_string(),
            due_date: inv.due_date.map(|d| d.to_string()),
            line_items: inv.line_items,
            tax_amount: inv.tax_amount,
            subtotal: inv.subtotal,
            payment_terms: inv.payment_terms,
            status: inv.status,
            confidence: inv.confidence,
            extraction_method: inv.extraction_method,
            created_at: inv.created_utc.to_rfc3339(),
            updated_at: inv.updated_utc.map(|d| d.to_rfc3339()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListParams {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListData {
    pub invoices: Vec<InvoiceResponse>,
    pub page: i64,
    pub page_size: i64,
}

/// Admin approve/reject request body, shared by invoices and reimbursements.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub decision: String,
    pub admin_notes: Option<String>,
}

impl DecisionRequest {
    /// Returns `Some(true)` for "approved", `Some(false)` for "rejected",
    /// and `None` for anything else.
    pub fn approve(&self) -> Option<bool> {
        match self.decision.as_str() {
            "approved" => Some(true),
            "rejected" => Some(false),
            _ => None,
        }
    }
}

/// Parses an optional status query string, rejecting unknown values rather
/// than silently mapping them to pending.
pub fn parse_status_filter(status: Option<&str>) -> Result<Option<InvoiceStatus>, String> {
    match status {
        None => Ok(None),
        Some(s) => match s {
            "pending" => Ok(Some(InvoiceStatus::Pending)),
            "approved" => Ok(Some(InvoiceStatus::Approved)),
            "rejected" => Ok(Some(InvoiceStatus::Rejected)),
            "paid" => Ok(Some(InvoiceStatus::Paid)),
            other => Err(format!("Unknown status: {}", other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_parsing() {
        let approve = DecisionRequest {
            decision: "approved".to_string(),
            admin_notes: None,
        };
        let reject = DecisionRequest {
            decision: "rejected".to_string(),
            admin_notes: None,
        };
        let junk = DecisionRequest {
            decision: "maybe".to_string(),
            admin_notes: None,
        };
        assert_eq!(approve.approve(), Some(true));
        assert_eq!(reject.approve(), Some(false));
        assert_eq!(junk.approve(), None);
    }

    #[test]
    fn status_filter_rejects_unknown_values() {
        assert_eq!(parse_status_filter(None), Ok(None));
        assert_eq!(
            parse_status_filter(Some("paid")),
            Ok(Some(InvoiceStatus::Paid))
        );
        assert!(parse_status_filter(Some("open")).is_err());
    }
}
