use bigdecimal::{BigDecimal, ToPrimitive};
use sqlx::{FromRow, PgPool};

use crate::models::AssetAllocationRow;

#[derive(Debug, FromRow)]
struct AllocationRecord {
    portfolio_id: i64,
    portfolio_name: String,
    asset_class: String,
    class_value: BigDecimal,
}

impl TryFrom<AllocationRecord> for AssetAllocationRow {
    type Error = sqlx::Error;

    fn try_from(record: AllocationRecord) -> Result<Self, Self::Error> {
        let class_value = class_value_to_f64(&record)?;
        Ok(Self {
            portfolio_id: record.portfolio_id,
            portfolio_name: record.portfolio_name,
            asset_class: record.asset_class,
            class_value,
        })
    }
}

/// A value outside f64 range fails the read rather than skewing the totals.
fn class_value_to_f64(record: &AllocationRecord) -> Result<f64, sqlx::Error> {
    match record.class_value.to_f64() {
        Some(value) if value.is_finite() => Ok(value),
        _ => {
            tracing::warn!(
                "⚠️ Portfolio {} class '{}' has unrepresentable value {}",
                record.portfolio_id,
                record.asset_class,
                record.class_value
            );
            Err(sqlx::Error::Decode(
                format!(
                    "class_value {} for portfolio {} ({}) does not fit in f64",
                    record.class_value, record.portfolio_id, record.asset_class
                )
                .into(),
            ))
        }
    }
}

/// Per-portfolio, per-asset-class totals from the `vw_asset_allocation` view.
pub async fn fetch_asset_allocations(pool: &PgPool) -> Result<Vec<AssetAllocationRow>, sqlx::Error> {
    let records = sqlx::query_as::<_, AllocationRecord>(
        r#"
        SELECT
            portfolio_id::BIGINT AS portfolio_id,
            portfolio_name,
            asset_class,
            COALESCE(class_value, 0)::NUMERIC AS class_value
        FROM vw_asset_allocation
        ORDER BY portfolio_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    records.into_iter().map(AssetAllocationRow::try_from).collect()
}
