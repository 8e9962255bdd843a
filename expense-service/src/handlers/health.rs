use crate::services::metrics::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use expense_core::error::AppError;
use serde_json::json;

/// Liveness check. Always succeeds while the process is up.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "expense-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness check: verifies the database and model provider.
pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.db.health_check().await?;

    if let Err(e) = state.provider.health_check().await {
        tracing::error!(error = %e, "Model provider readiness check failed");
        return Err(AppError::ServiceUnavailable);
    }

    Ok(Json(json!({ "status": "ready" })))
}

/// Prometheus metrics in text exposition format.
pub async fn metrics() -> impl IntoResponse {
    get_metrics()
}
