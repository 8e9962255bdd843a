pub mod invoices;
pub mod reimbursements;
pub mod reports;

pub use invoices::*;
pub use reimbursements::*;
pub use reports::*;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Standard response envelope for all API endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}
