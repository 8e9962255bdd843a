use crate::dtos::{ApiEnvelope, ReimbursementResponse, ReportSummaryData, StatusCounts};
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use expense_core::error::AppError;

const RECENT_REQUEST_LIMIT: i64 = 10;

/// Admin dashboard summary. Aggregates run concurrently; a failed branch
/// logs and degrades to its zero value so one slow or broken query never
/// blanks the whole dashboard.
pub async fn report_summary(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let (reimbursement_counts, invoice_counts, approved_total, recent) = tokio::join!(
        state.db.count_reimbursements_by_status(),
        state.db.count_invoices_by_status(),
        state.db.sum_approved_reimbursements(),
        state.db.recent_reimbursements(RECENT_REQUEST_LIMIT),
    );

    let reimbursements = match reimbursement_counts {
        Ok(rows) => StatusCounts::from_rows(&rows, false),
        Err(e) => {
            tracing::warn!(error = %e, "Reimbursement count aggregate failed");
            StatusCounts::default()
        }
    };

    let invoices = match invoice_counts {
        Ok(rows) => StatusCounts::from_rows(&rows, true),
        Err(e) => {
            tracing::warn!(error = %e, "Invoice count aggregate failed");
            StatusCounts {
                paid: Some(0),
                ..StatusCounts::default()
            }
        }
    };

    let total_approved_amount = match approved_total {
        Ok(total) => total,
        Err(e) => {
            tracing::warn!(error = %e, "Approved amount aggregate failed");
            0.0
        }
    };

    let recent_requests = match recent {
        Ok(rows) => rows.into_iter().map(ReimbursementResponse::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Recent requests query failed");
            Vec::new()
        }
    };

    let data = ReportSummaryData {
        reimbursements,
        invoices,
        total_approved_amount,
        recent_requests,
    };

    Ok(Json(ApiEnvelope::ok("Report summary", data)))
}
