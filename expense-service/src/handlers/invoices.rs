use crate::dtos::{
    parse_status_filter, ApiEnvelope, DecisionRequest, InvoiceListData, InvoiceListParams,
    InvoiceResponse, UploadData,
};
use crate::models::ListInvoicesFilter;
use crate::services::extraction::ExtractionError;
use crate::services::metrics::ERRORS_TOTAL;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Json,
};
use expense_core::error::AppError;
use uuid::Uuid;

/// Upload an invoice document and run the extraction pipeline. Expects a
/// multipart form with a `file` part and a `userId` part.
pub async fn upload_invoice(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
                    })?
                    .to_vec();
                file = Some((file_name, media_type, data));
            }
            Some("userId") => {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read userId field: {}", e))
                })?;
                user_id = Some(value);
            }
            _ => {}
        }
    }

    let (file_name, media_type, data) =
        file.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing file field")))?;
    let user_id = user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing userId field")))?;

    if data.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Uploaded file is empty")));
    }

    tracing::info!(
        file_name = %file_name,
        media_type = %media_type,
        size = data.len(),
        user_id = %user_id,
        "Invoice upload started"
    );

    let result = state
        .pipeline
        .process(&data, &file_name, &media_type)
        .await
        .map_err(|e| match e {
            ExtractionError::UnsupportedMediaType(mt) => {
                ERRORS_TOTAL
                    .with_label_values(&["unsupported_media_type"])
                    .inc();
                AppError::UnsupportedMediaType(mt)
            }
            ExtractionError::Provider(pe) => {
                ERRORS_TOTAL.with_label_values(&["provider"]).inc();
                AppError::BadGateway(pe.to_string())
            }
        })?;

    let invoice = state.db.insert_invoice(&user_id, &result).await?;

    let data = UploadData {
        invoice_id: invoice.invoice_id,
        extracted_data: result.extracted,
        confidence: result.confidence,
        method: result.method.as_str().to_string(),
    };

    Ok(Json(ApiEnvelope::ok("Invoice processed successfully", data)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<InvoiceListParams>,
) -> Result<impl IntoResponse, AppError> {
    let status = parse_status_filter(params.status.as_deref())
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?;

    let filter = ListInvoicesFilter {
        owner_id: params.user_id,
        status,
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(20),
    };

    let invoices = state.db.list_invoices(&filter).await?;

    let data = InvoiceListData {
        invoices: invoices.into_iter().map(InvoiceResponse::from).collect(),
        page: filter.page.max(1),
        page_size: filter.page_size.clamp(1, 100),
    };

    Ok(Json(ApiEnvelope::ok("Invoices retrieved", data)))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    Ok(Json(ApiEnvelope::ok(
        "Invoice retrieved",
        InvoiceResponse::from(invoice),
    )))
}

/// Approve or reject a pending invoice.
pub async fn decide_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let approve = request.approve().ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Decision must be 'approved' or 'rejected'"
        ))
    })?;

    let invoice = state.db.decide_invoice(invoice_id, approve).await?;

    Ok(Json(ApiEnvelope::ok(
        format!("Invoice {}", invoice.status),
        InvoiceResponse::from(invoice),
    )))
}

/// Mark an approved invoice as paid.
pub async fn pay_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.db.mark_invoice_paid(invoice_id).await?;

    Ok(Json(ApiEnvelope::ok(
        "Invoice marked as paid",
        InvoiceResponse::from(invoice),
    )))
}
