use crate::dtos::{
    parse_reimbursement_status, ApiEnvelope, CreateReimbursementRequest, DecisionRequest,
    ReimbursementListData, ReimbursementListParams, ReimbursementResponse,
};
use crate::models::{CreateReimbursement, ListReimbursementsFilter};
use crate::services::metrics::REIMBURSEMENT_DECISIONS_TOTAL;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use expense_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

/// Submit a new reimbursement request. When the request references an
/// invoice, that invoice must exist.
pub async fn create_reimbursement(
    State(state): State<AppState>,
    Json(request): Json<CreateReimbursementRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    if let Some(invoice_id) = request.invoice_id {
        if state.db.get_invoice(invoice_id).await?.is_none() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Referenced invoice does not exist"
            )));
        }
    }

    let input = CreateReimbursement {
        employee_id: request.employee_id,
        employee_name: request.employee_name,
        invoice_id: request.invoice_id,
        amount: request.amount,
        currency: request
            .currency
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| "USD".to_string()),
        business_purpose: request.business_purpose,
    };

    let reimbursement = state.db.create_reimbursement(&input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok(
            "Reimbursement request submitted",
            ReimbursementResponse::from(reimbursement),
        )),
    ))
}

pub async fn list_reimbursements(
    State(state): State<AppState>,
    Query(params): Query<ReimbursementListParams>,
) -> Result<impl IntoResponse, AppError> {
    let status = parse_reimbursement_status(params.status.as_deref())
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;

    let filter = ListReimbursementsFilter {
        employee_id: params.employee_id,
        status,
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(20),
    };

    let reimbursements = state.db.list_reimbursements(&filter).await?;

    let data = ReimbursementListData {
        reimbursements: reimbursements
            .into_iter()
            .map(ReimbursementResponse::from)
            .collect(),
        page: filter.page.max(1),
        page_size: filter.page_size.clamp(1, 100),
    };

    Ok(Json(ApiEnvelope::ok("Reimbursements retrieved", data)))
}

pub async fn get_reimbursement(
    State(state): State<AppState>,
    Path(reimbursement_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reimbursement = state
        .db
        .get_reimbursement(reimbursement_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Reimbursement not found")))?;

    Ok(Json(ApiEnvelope::ok(
        "Reimbursement retrieved",
        ReimbursementResponse::from(reimbursement),
    )))
}

/// Approve or reject a pending reimbursement request.
pub async fn decide_reimbursement(
    State(state): State<AppState>,
    Path(reimbursement_id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let approve = request.approve().ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Decision must be 'approved' or 'rejected'"
        ))
    })?;

    let reimbursement = state
        .db
        .decide_reimbursement(reimbursement_id, approve, request.admin_notes.as_deref())
        .await?;

    REIMBURSEMENT_DECISIONS_TOTAL
        .with_label_values(&[reimbursement.status.as_str()])
        .inc();

    Ok(Json(ApiEnvelope::ok(
        format!("Reimbursement {}", reimbursement.status),
        ReimbursementResponse::from(reimbursement),
    )))
}
