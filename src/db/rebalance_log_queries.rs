use sqlx::PgPool;

use crate::models::RebalanceLogEntry;

/// Append `entries` to `rebalance_log` as one all-or-nothing batch.
///
/// The transaction rolls back when dropped, so an error on any insert leaves
/// none of the batch committed.
pub async fn insert_rebalance_logs(
    pool: &PgPool,
    entries: &[RebalanceLogEntry],
) -> Result<u64, sqlx::Error> {
    if entries.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut written = 0;

    for entry in entries {
        let result = sqlx::query(
            r#"
            INSERT INTO rebalance_log (portfolio_id, advisor_id, rebalance_date, reason, status)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.portfolio_id)
        .bind(entry.advisor_id)
        .bind(entry.rebalance_date)
        .bind(&entry.reason)
        .bind(&entry.status)
        .execute(&mut *tx)
        .await?;

        written += result.rows_affected();
    }

    tx.commit().await?;

    Ok(written)
}
