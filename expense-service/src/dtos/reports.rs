use super::ReimbursementResponse;
use serde::Serialize;

/// Aggregated dashboard summary. Each section is computed independently;
/// a failed aggregate degrades to its zero value instead of failing the
/// whole report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummaryData {
    pub reimbursements: StatusCounts,
    pub invoices: StatusCounts,
    pub total_approved_amount: f64,
    pub recent_requests: Vec<ReimbursementResponse>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid: Option<i64>,
    pub total: i64,
}

impl StatusCounts {
    /// Fold `(status, count)` rows into the fixed shape. Unknown statuses
    /// still count toward the total.
    pub fn from_rows(rows: &[(String, i64)], include_paid: bool) -> Self {
        let mut counts = StatusCounts {
            paid: include_paid.then_some(0),
            ..StatusCounts::default()
        };
        for (status, count) in rows {
            match status.as_str() {
                "pending" => counts.pending = *count,
                "approved" => counts.approved = *count,
                "rejected" => counts.rejected = *count,
                "paid" if include_paid => counts.paid = Some(*count),
                _ => {}
            }
            counts.total += count;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_status_rows() {
        let rows = vec![
            ("pending".to_string(), 3),
            ("approved".to_string(), 5),
            ("paid".to_string(), 2),
        ];
        let counts = StatusCounts::from_rows(&rows, true);
        assert_eq!(counts.pending, 3);
        assert_eq!(counts.approved, 5);
        assert_eq!(counts.rejected, 0);
        assert_eq!(counts.paid, Some(2));
        assert_eq!(counts.total, 10);
    }

    #[test]
    fn paid_is_omitted_for_reimbursements() {
        let counts = StatusCounts::from_rows(&[("approved".to_string(), 1)], false);
        assert_eq!(counts.paid, None);
        assert_eq!(counts.total, 1);
    }
}
