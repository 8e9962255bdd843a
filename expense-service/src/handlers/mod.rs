pub mod health;
pub mod invoices;
pub mod reimbursements;
pub mod reports;

pub use health::{health_check, metrics, readiness_check};
pub use invoices::{decide_invoice, get_invoice, list_invoices, pay_invoice, upload_invoice};
pub use reimbursements::{
    create_reimbursement, decide_reimbursement, get_reimbursement, list_reimbursements,
};
pub use reports::report_summary;
