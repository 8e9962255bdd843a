//! Reimbursement request model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reimbursement lifecycle status. A request is mutated exactly once, by
/// an admin approve/reject decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReimbursementStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReimbursementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReimbursementStatus::Pending => "pending",
            ReimbursementStatus::Approved => "approved",
            ReimbursementStatus::Rejected => "rejected",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "approved" => ReimbursementStatus::Approved,
            "rejected" => ReimbursementStatus::Rejected,
            _ => ReimbursementStatus::Pending,
        }
    }

    /// Admin decision. Only valid from `Pending`.
    pub fn decide(self, approve: bool) -> Option<ReimbursementStatus> {
        match self {
            ReimbursementStatus::Pending if approve => Some(ReimbursementStatus::Approved),
            ReimbursementStatus::Pending => Some(ReimbursementStatus::Rejected),
            _ => None,
        }
    }
}

/// Persisted reimbursement request.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reimbursement {
    pub reimbursement_id: Uuid,
    pub employee_id: String,
    pub employee_name: String,
    pub invoice_id: Option<Uuid>,
    pub amount: f64,
    pub currency: String,
    pub business_purpose: String,
    pub status: String,
    pub admin_notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub approved_utc: Option<DateTime<Utc>>,
}

/// Input for creating a reimbursement request.
#[derive(Debug, Clone)]
pub struct CreateReimbursement {
    pub employee_id: String,
    pub employee_name: String,
    pub invoice_id: Option<Uuid>,
    pub amount: f64,
    pub currency: String,
    pub business_purpose: String,
}

/// Filter parameters for listing reimbursements.
#[derive(Debug, Clone, Default)]
pub struct ListReimbursementsFilter {
    pub employee_id: Option<String>,
    pub status: Option<ReimbursementStatus>,
    pub page: i64,
    pub page_size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_is_exactly_once() {
        assert_eq!(
            ReimbursementStatus::Pending.decide(true),
            Some(ReimbursementStatus::Approved)
        );
        assert_eq!(
            ReimbursementStatus::Pending.decide(false),
            Some(ReimbursementStatus::Rejected)
        );
        assert_eq!(ReimbursementStatus::Approved.decide(false), None);
        assert_eq!(ReimbursementStatus::Rejected.decide(true), None);
    }
}
