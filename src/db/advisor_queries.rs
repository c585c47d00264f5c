use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};

use crate::models::AdvisorAssignment;

#[derive(Debug, FromRow)]
struct AssignmentRecord {
    portfolio_id: i64,
    advisor_id: i64,
    is_primary: Option<bool>,
    end_date: Option<NaiveDate>,
}

impl From<AssignmentRecord> for AdvisorAssignment {
    fn from(record: AssignmentRecord) -> Self {
        Self {
            portfolio_id: record.portfolio_id,
            advisor_id: record.advisor_id,
            is_primary: record.is_primary.unwrap_or(false),
            end_date: record.end_date,
        }
    }
}

/// Advisor assignments reachable from each portfolio through its account's client.
///
/// Rows come back per portfolio with primary assignments first. Active-date
/// filtering happens in `advisor_resolver` so there is a single notion of "today".
pub async fn fetch_advisor_assignments(pool: &PgPool) -> Result<Vec<AdvisorAssignment>, sqlx::Error> {
    let records = sqlx::query_as::<_, AssignmentRecord>(
        r#"
        SELECT
            p.portfolio_id::BIGINT AS portfolio_id,
            ca.advisor_id::BIGINT AS advisor_id,
            ca.is_primary AS is_primary,
            ca.end_date AS end_date
        FROM portfolio p
        JOIN account a ON p.account_id = a.account_id
        JOIN client_advisor ca ON a.client_id = ca.client_id
        ORDER BY p.portfolio_id, ca.is_primary DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(records.into_iter().map(AdvisorAssignment::from).collect())
}
