//! Prometheus metrics for expense-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, CounterVec, Histogram,
    HistogramVec, TextEncoder,
};

/// Extraction counter by acquisition method and parse outcome.
pub static EXTRACTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "expense_extractions_total",
        "Total number of extraction runs",
        &["method", "outcome"] // pdf-text/ocr-image, structured/fallback
    )
    .expect("Failed to register extractions_total")
});

/// Confidence score distribution.
pub static EXTRACTION_CONFIDENCE: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "expense_extraction_confidence",
        "Confidence score of extraction results",
        vec![0.5, 0.6, 0.7, 0.75, 0.8, 0.85, 0.9, 0.95, 1.0]
    )
    .expect("Failed to register extraction_confidence")
});

/// Reimbursement decision counter.
pub static REIMBURSEMENT_DECISIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "expense_reimbursement_decisions_total",
        "Total number of reimbursement decisions",
        &["decision"] // approved, rejected
    )
    .expect("Failed to register reimbursement_decisions_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "expense_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "expense_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&EXTRACTIONS_TOTAL);
    Lazy::force(&EXTRACTION_CONFIDENCE);
    Lazy::force(&REIMBURSEMENT_DECISIONS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
