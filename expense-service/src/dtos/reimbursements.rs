use crate::models::{Reimbursement, ReimbursementStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request body for creating a reimbursement request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReimbursementRequest {
    #[validate(length(min = 1, message = "employeeId is required"))]
    pub employee_id: String,
    #[validate(length(min = 1, message = "employeeName is required"))]
    pub employee_name: String,
    pub invoice_id: Option<Uuid>,
    #[validate(range(min = 0.01, message = "amount must be positive"))]
    pub amount: f64,
    #[validate(length(min = 3, max = 3, message = "currency must be a 3-letter code"))]
    pub currency: Option<String>,
    #[validate(length(min = 1, message = "businessPurpose is required"))]
    pub business_purpose: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReimbursementResponse {
    pub reimbursement_id: Uuid,
    pub employee_id: String,
    pub employee_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<Uuid>,
    pub amount: f64,
    pub currency: String,
    pub business_purpose: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
}

impl From<Reimbursement> for ReimbursementResponse {
    fn from(r: Reimbursement) -> Self {
        Self {
            reimbursement_id: r.reimbursement_id,
            employee_id: r.employee_id,
            employee_name: r.employee_name,
            invoice_id: r.invoice_id,
            amount: r.amount,
            currency: r.currency,
            business_purpose: r.business_purpose,
            status: r.status,
            admin_notes: r.admin_notes,
            created_at: r.created_utc.to_rfc3339(),
            approved_at: r.approved_utc.map(|d| d.to_rfc3339()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReimbursementListParams {
    pub employee_id: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReimbursementListData {
    pub reimbursements: Vec<ReimbursementResponse>,
    pub page: i64,
    pub page_size: i64,
}

pub fn parse_reimbursement_status(
    status: Option<&str>,
) -> Result<Option<ReimbursementStatus>, String> {
    match status {
        None => Ok(None),
        Some(s) => match s {
            "pending" => Ok(Some(ReimbursementStatus::Pending)),
            "approved" => Ok(Some(ReimbursementStatus::Approved)),
            "rejected" => Ok(Some(ReimbursementStatus::Rejected)),
            other => Err(format!("Unknown status: {}", other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_validation() {
        let valid = CreateReimbursementRequest {
            employee_id: "emp-42".to_string(),
            employee_name: "Dana Smith".to_string(),
            invoice_id: None,
            amount: 125.50,
            currency: Some("EUR".to_string()),
            business_purpose: "Client dinner".to_string(),
        };
        assert!(valid.validate().is_ok());

        let no_amount = CreateReimbursementRequest {
            amount: 0.0,
            ..valid
        };
        assert!(no_amount.validate().is_err());
    }

    #[test]
    fn reimbursement_status_filter() {
        assert_eq!(
            parse_reimbursement_status(Some("approved")),
            Ok(Some(ReimbursementStatus::Approved))
        );
        assert!(parse_reimbursement_status(Some("paid")).is_err());
    }
}
