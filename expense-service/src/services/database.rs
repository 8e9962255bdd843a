//! Database service for expense-service.

use crate::models::{
    CreateReimbursement, ExtractionResult, Invoice, InvoiceStatus, ListInvoicesFilter,
    ListReimbursementsFilter, Reimbursement, ReimbursementStatus,
};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::Utc;
use expense_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "expense-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    /// Persist a pipeline result as a new pending invoice.
    #[instrument(skip(self, result), fields(owner_id = %owner_id))]
    pub async fn insert_invoice(
        &self,
        owner_id: &str,
        result: &ExtractionResult,
    ) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();

        let line_items = serde_json::to_value(&result.extracted.line_items)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Line item encoding: {}", e)))?;

        let invoice_id = Uuid::new_v4();
        let draft = &result.extracted;
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_id, owner_id, invoice_number, vendor_name, vendor_address,
                amount, currency, invoice_date, due_date, line_items,
                tax_amount, subtotal, payment_terms, status, confidence,
                extraction_method, raw_text, created_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(invoice_id)
        .bind(owner_id)
        .bind(&draft.invoice_number)
        .bind(&draft.vendor_name)
        .bind(&draft.vendor_address)
        .bind(draft.amount)
        .bind(&draft.currency)
        .bind(draft.invoice_date)
        .bind(draft.due_date)
        .bind(line_items)
        .bind(draft.tax_amount)
        .bind(draft.subtotal)
        .bind(&draft.payment_terms)
        .bind(InvoiceStatus::Pending.as_str())
        .bind(result.confidence)
        .bind(result.method.as_str())
        .bind(&result.raw_text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert invoice: {}", e)))?;

        timer.observe_duration();

        info!(
            invoice_id = %invoice.invoice_id,
            invoice_number = %invoice.invoice_number,
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Get an invoice by ID.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// List invoices, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_invoices(
        &self,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let page_size = filter.page_size.clamp(1, 100);
        let offset = (filter.page.max(1) - 1) * page_size;

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT * FROM invoices
            WHERE ($1::text IS NULL OR owner_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_utc DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.owner_id.as_deref())
        .bind(filter.status.map(|s| s.as_str()))
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Apply an admin decision to a pending invoice. The transition is
    /// validated through `InvoiceStatus::decide` and the UPDATE is guarded
    /// on the observed status, so a terminal-state invoice is never
    /// overwritten even under concurrent decisions.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn decide_invoice(&self, invoice_id: Uuid, approve: bool) -> Result<Invoice, AppError> {
        let current = self
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        let current_status = InvoiceStatus::from_string(&current.status);
        let new_status = current_status.decide(approve).ok_or_else(|| {
            AppError::Conflict(anyhow::anyhow!(
                "Invoice is already {} and cannot be decided again",
                current.status
            ))
        })?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["decide_invoice"])
            .start_timer();

        let updated = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = $2, updated_utc = $3
            WHERE invoice_id = $1 AND status = $4
            RETURNING *
            "#,
        )
        .bind(invoice_id)
        .bind(new_status.as_str())
        .bind(Utc::now())
        .bind(current_status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e))
        })?;

        timer.observe_duration();

        match updated {
            Some(invoice) => {
                info!(invoice_id = %invoice.invoice_id, status = %invoice.status, "Invoice decided");
                Ok(invoice)
            }
            // Raced with another decision.
            None => Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice was decided concurrently"
            ))),
        }
    }

    /// Mark an approved invoice as paid. Same guarded-UPDATE shape as the
    /// decision: only the approved state can transition to paid.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn mark_invoice_paid(&self, invoice_id: Uuid) -> Result<Invoice, AppError> {
        let current = self
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        InvoiceStatus::from_string(&current.status)
            .mark_paid()
            .ok_or_else(|| {
                AppError::Conflict(anyhow::anyhow!(
                    "Only an approved invoice can be paid, this one is {}",
                    current.status
                ))
            })?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_invoice_paid"])
            .start_timer();

        let updated = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = 'paid', updated_utc = $2
            WHERE invoice_id = $1 AND status = 'approved'
            RETURNING *
            "#,
        )
        .bind(invoice_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e))
        })?;

        timer.observe_duration();

        match updated {
            Some(invoice) => {
                info!(invoice_id = %invoice.invoice_id, "Invoice marked paid");
                Ok(invoice)
            }
            None => Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice was decided concurrently"
            ))),
        }
    }

    // -------------------------------------------------------------------------
    // Reimbursement Operations
    // -------------------------------------------------------------------------

    /// Create a new reimbursement request.
    #[instrument(skip(self, input), fields(employee_id = %input.employee_id))]
    pub async fn create_reimbursement(
        &self,
        input: &CreateReimbursement,
    ) -> Result<Reimbursement, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_reimbursement"])
            .start_timer();

        let reimbursement_id = Uuid::new_v4();
        let reimbursement = sqlx::query_as::<_, Reimbursement>(
            r#"
            INSERT INTO reimbursements (
                reimbursement_id, employee_id, employee_name, invoice_id,
                amount, currency, business_purpose, status, created_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(reimbursement_id)
        .bind(&input.employee_id)
        .bind(&input.employee_name)
        .bind(input.invoice_id)
        .bind(input.amount)
        .bind(&input.currency)
        .bind(&input.business_purpose)
        .bind(ReimbursementStatus::Pending.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create reimbursement: {}", e))
        })?;

        timer.observe_duration();

        info!(
            reimbursement_id = %reimbursement.reimbursement_id,
            employee_id = %reimbursement.employee_id,
            "Reimbursement request created"
        );

        Ok(reimbursement)
    }

    /// Get a reimbursement by ID.
    #[instrument(skip(self), fields(reimbursement_id = %reimbursement_id))]
    pub async fn get_reimbursement(
        &self,
        reimbursement_id: Uuid,
    ) -> Result<Option<Reimbursement>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_reimbursement"])
            .start_timer();

        let reimbursement = sqlx::query_as::<_, Reimbursement>(
            "SELECT * FROM reimbursements WHERE reimbursement_id = $1",
        )
        .bind(reimbursement_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get reimbursement: {}", e))
        })?;

        timer.observe_duration();

        Ok(reimbursement)
    }

    /// List reimbursement requests, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_reimbursements(
        &self,
        filter: &ListReimbursementsFilter,
    ) -> Result<Vec<Reimbursement>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_reimbursements"])
            .start_timer();

        let page_size = filter.page_size.clamp(1, 100);
        let offset = (filter.page.max(1) - 1) * page_size;

        let reimbursements = sqlx::query_as::<_, Reimbursement>(
            r#"
            SELECT * FROM reimbursements
            WHERE ($1::text IS NULL OR employee_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_utc DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.employee_id.as_deref())
        .bind(filter.status.map(|s| s.as_str()))
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list reimbursements: {}", e))
        })?;

        timer.observe_duration();

        Ok(reimbursements)
    }

    /// Apply an admin decision to a pending reimbursement. Same
    /// validate-then-guarded-UPDATE as invoices: the transition happens
    /// exactly once.
    #[instrument(skip(self, admin_notes), fields(reimbursement_id = %reimbursement_id))]
    pub async fn decide_reimbursement(
        &self,
        reimbursement_id: Uuid,
        approve: bool,
        admin_notes: Option<&str>,
    ) -> Result<Reimbursement, AppError> {
        let current = self
            .get_reimbursement(reimbursement_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Reimbursement not found")))?;

        let new_status = ReimbursementStatus::from_string(&current.status)
            .decide(approve)
            .ok_or_else(|| {
                AppError::Conflict(anyhow::anyhow!(
                    "Reimbursement is already {} and cannot be decided again",
                    current.status
                ))
            })?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["decide_reimbursement"])
            .start_timer();

        let updated = sqlx::query_as::<_, Reimbursement>(
            r#"
            UPDATE reimbursements
            SET status = $2, admin_notes = $3, approved_utc = $4
            WHERE reimbursement_id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(reimbursement_id)
        .bind(new_status.as_str())
        .bind(admin_notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update reimbursement: {}", e))
        })?;

        timer.observe_duration();

        match updated {
            Some(reimbursement) => {
                info!(
                    reimbursement_id = %reimbursement.reimbursement_id,
                    status = %reimbursement.status,
                    "Reimbursement decided"
                );
                Ok(reimbursement)
            }
            None => Err(AppError::Conflict(anyhow::anyhow!(
                "Reimbursement was decided concurrently"
            ))),
        }
    }

    // -------------------------------------------------------------------------
    // Report Aggregates
    // -------------------------------------------------------------------------

    /// Reimbursement counts grouped by status.
    #[instrument(skip(self))]
    pub async fn count_reimbursements_by_status(&self) -> Result<Vec<(String, i64)>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_reimbursements_by_status"])
            .start_timer();

        let counts = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM reimbursements GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count reimbursements: {}", e))
        })?;

        timer.observe_duration();

        Ok(counts)
    }

    /// Invoice counts grouped by status.
    #[instrument(skip(self))]
    pub async fn count_invoices_by_status(&self) -> Result<Vec<(String, i64)>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_invoices_by_status"])
            .start_timer();

        let counts = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM invoices GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e)))?;

        timer.observe_duration();

        Ok(counts)
    }

    /// Sum of approved reimbursement amounts.
    #[instrument(skip(self))]
    pub async fn sum_approved_reimbursements(&self) -> Result<f64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["sum_approved_reimbursements"])
            .start_timer();

        let (total,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount), 0)::float8 FROM reimbursements WHERE status = 'approved'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to sum reimbursements: {}", e))
        })?;

        timer.observe_duration();

        Ok(total)
    }

    /// Most recent reimbursement requests for the admin dashboard.
    #[instrument(skip(self))]
    pub async fn recent_reimbursements(&self, limit: i64) -> Result<Vec<Reimbursement>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["recent_reimbursements"])
            .start_timer();

        let reimbursements = sqlx::query_as::<_, Reimbursement>(
            "SELECT * FROM reimbursements ORDER BY created_utc DESC LIMIT $1",
        )
        .bind(limit.clamp(1, 50))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch recent requests: {}", e))
        })?;

        timer.observe_duration();

        Ok(reimbursements)
    }
}
