use async_trait::async_trait;
use sqlx::PgPool;

use super::RebalanceStore;
use crate::db::{advisor_queries, allocation_queries, rebalance_log_queries};
use crate::models::{AdvisorAssignment, AssetAllocationRow, RebalanceLogEntry};

#[derive(Clone)]
pub struct PgRebalanceStore {
    pool: PgPool,
}

impl PgRebalanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RebalanceStore for PgRebalanceStore {
    async fn fetch_asset_allocations(&self) -> Result<Vec<AssetAllocationRow>, sqlx::Error> {
        allocation_queries::fetch_asset_allocations(&self.pool).await
    }

    async fn fetch_advisor_assignments(&self) -> Result<Vec<AdvisorAssignment>, sqlx::Error> {
        advisor_queries::fetch_advisor_assignments(&self.pool).await
    }

    async fn insert_rebalance_logs(&self, entries: &[RebalanceLogEntry]) -> Result<u64, sqlx::Error> {
        rebalance_log_queries::insert_rebalance_logs(&self.pool, entries).await
    }
}
