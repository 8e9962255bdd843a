//! Domain models for expense-service.

pub mod extraction;
pub mod invoice;
pub mod reimbursement;

pub use extraction::{ExtractionMethod, ExtractionResult};
pub use invoice::{Invoice, InvoiceDraft, InvoiceStatus, LineItem, ListInvoicesFilter};
pub use reimbursement::{
    CreateReimbursement, ListReimbursementsFilter, Reimbursement, ReimbursementStatus,
};
