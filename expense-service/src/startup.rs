use crate::config::ExpenseConfig;
use crate::handlers;
use crate::services::providers::gemini::{GeminiConfig, GeminiProvider};
use crate::services::{Database, ExtractionPipeline, VisionModelProvider};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use expense_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: ExpenseConfig,
    pub db: Database,
    pub provider: Arc<dyn VisionModelProvider>,
    pub pipeline: Arc<ExtractionPipeline>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: ExpenseConfig) -> Result<Self, AppError> {
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            e
        })?;
        db.run_migrations().await?;

        let provider: Arc<dyn VisionModelProvider> = Arc::new(GeminiProvider::new(GeminiConfig {
            api_key: config.google.api_key.clone(),
            model: config.models.extraction_model.clone(),
        }));
        let pipeline = Arc::new(ExtractionPipeline::new(provider.clone()));

        let state = AppState {
            config: config.clone(),
            db,
            provider,
            pipeline,
        };

        let app = Self::router(state.clone())
            .layer(DefaultBodyLimit::max(config.upload.max_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics))
            .route("/invoices/upload", post(handlers::upload_invoice))
            .route("/invoices", get(handlers::list_invoices))
            .route("/invoices/:id", get(handlers::get_invoice))
            .route("/invoices/:id/decision", post(handlers::decide_invoice))
            .route("/invoices/:id/payment", post(handlers::pay_invoice))
            .route(
                "/reimbursements",
                post(handlers::create_reimbursement).get(handlers::list_reimbursements),
            )
            .route("/reimbursements/:id", get(handlers::get_reimbursement))
            .route(
                "/reimbursements/:id/decision",
                post(handlers::decide_reimbursement),
            )
            .route("/reports/summary", get(handlers::report_summary))
            .with_state(state)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
