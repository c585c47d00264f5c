//! Data-store seam for the rebalance engine.
//!
//! The engine only needs three operations from the relational store: the
//! allocation view, the advisor assignment join and the append-only
//! rebalance log. `PgRebalanceStore` is the production implementation; tests
//! provide in-memory ones.

mod postgres;

use async_trait::async_trait;

use crate::models::{AdvisorAssignment, AssetAllocationRow, RebalanceLogEntry};

pub use postgres::PgRebalanceStore;

#[async_trait]
pub trait RebalanceStore: Send + Sync {
    async fn fetch_asset_allocations(&self) -> Result<Vec<AssetAllocationRow>, sqlx::Error>;

    async fn fetch_advisor_assignments(&self) -> Result<Vec<AdvisorAssignment>, sqlx::Error>;

    /// Appends all entries or none of them. Returns the number of rows written.
    async fn insert_rebalance_logs(&self, entries: &[RebalanceLogEntry]) -> Result<u64, sqlx::Error>;
}
