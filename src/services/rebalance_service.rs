//! Rebalance drift engine.
//!
//! One run reads the current allocation of every portfolio, compares it with
//! the configured target weights, and appends a `Pending` entry to the
//! rebalance log for each portfolio with at least one asset class drifting
//! past the threshold. Runs are independent: nothing is carried over, and a
//! portfolio flagged on consecutive runs is logged each time.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::rebalance::STATUS_PENDING;
use crate::models::{RebalanceConfig, RebalanceLogEntry, RebalanceSummary, Recommendation};
use crate::services::advisor_resolver::resolve_advisors;
use crate::services::drift_calculator::{assess_portfolio, group_by_portfolio};
use crate::store::RebalanceStore;

#[derive(Clone)]
pub struct RebalanceService {
    store: Arc<dyn RebalanceStore>,
    config: Arc<RebalanceConfig>,
}

impl RebalanceService {
    pub fn new(store: Arc<dyn RebalanceStore>, config: Arc<RebalanceConfig>) -> Self {
        Self { store, config }
    }

    pub async fn run(&self, drift_threshold: f64, today: NaiveDate) -> Result<RebalanceSummary, AppError> {
        info!("🔍 Starting rebalance analysis (threshold {:.2}pp)", drift_threshold);

        let rows = self.store.fetch_asset_allocations().await.map_err(|e| {
            error!("Failed to read asset allocations: {}", e);
            AppError::Db(e)
        })?;

        if rows.is_empty() {
            info!("No portfolio allocations found, nothing to analyse");
            return Ok(RebalanceSummary::empty());
        }

        let assignments = self.store.fetch_advisor_assignments().await.map_err(|e| {
            error!("Failed to read advisor assignments: {}", e);
            AppError::Db(e)
        })?;
        let advisors = resolve_advisors(&assignments, today);

        let portfolios = group_by_portfolio(&rows);
        let mut recommendations = Vec::new();

        for allocation in &portfolios {
            if allocation.total_value() <= 0.0 {
                warn!("Portfolio {} has no value, skipping", allocation.portfolio_id);
                continue;
            }

            let Some(assessment) = assess_portfolio(allocation, &self.config, drift_threshold) else {
                continue;
            };

            let advisor_id = match advisors.get(&allocation.portfolio_id) {
                Some(id) => *id,
                None => {
                    warn!(
                        "Portfolio {} has no active advisor, assigning advisor {}",
                        allocation.portfolio_id, self.config.fallback_advisor_id
                    );
                    self.config.fallback_advisor_id
                }
            };

            recommendations.push(Recommendation {
                portfolio_id: allocation.portfolio_id,
                portfolio_name: allocation.portfolio_name.clone(),
                total_value: assessment.total_value,
                flagged_classes: assessment.flagged,
                reason: assessment.reason,
                advisor_id,
                rebalance_date: today,
                status: STATUS_PENDING.to_string(),
            });
        }

        let entries: Vec<RebalanceLogEntry> = recommendations.iter().map(RebalanceLogEntry::from).collect();

        let logs_written = self.store.insert_rebalance_logs(&entries).await.map_err(|e| {
            error!("Failed to write {} rebalance log entries: {}", entries.len(), e);
            AppError::Write(e)
        })?;

        info!(
            "Rebalance analysis complete: {} portfolios analysed, {} flagged, {} log rows written",
            portfolios.len(),
            recommendations.len(),
            logs_written
        );

        Ok(RebalanceSummary {
            portfolios_analysed: portfolios.len(),
            portfolios_flagged: recommendations.len(),
            logs_written,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdvisorAssignment, AssetAllocationRow};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        allocations: Vec<AssetAllocationRow>,
        assignments: Vec<AdvisorAssignment>,
        log: Mutex<Vec<RebalanceLogEntry>>,
        fail_reads: bool,
        fail_writes: bool,
    }

    #[async_trait]
    impl RebalanceStore for MemoryStore {
        async fn fetch_asset_allocations(&self) -> Result<Vec<AssetAllocationRow>, sqlx::Error> {
            if self.fail_reads {
                return Err(sqlx::Error::PoolTimedOut);
            }
            Ok(self.allocations.clone())
        }

        async fn fetch_advisor_assignments(&self) -> Result<Vec<AdvisorAssignment>, sqlx::Error> {
            Ok(self.assignments.clone())
        }

        async fn insert_rebalance_logs(&self, entries: &[RebalanceLogEntry]) -> Result<u64, sqlx::Error> {
            if self.fail_writes {
                return Err(sqlx::Error::PoolClosed);
            }
            let mut log = self.log.lock().unwrap();
            log.extend_from_slice(entries);
            Ok(entries.len() as u64)
        }
    }

    fn row(portfolio_id: i64, name: &str, asset_class: &str, class_value: f64) -> AssetAllocationRow {
        AssetAllocationRow {
            portfolio_id,
            portfolio_name: name.to_string(),
            asset_class: asset_class.to_string(),
            class_value,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn service(store: Arc<MemoryStore>) -> RebalanceService {
        RebalanceService::new(store, Arc::new(RebalanceConfig::default()))
    }

    #[tokio::test]
    async fn test_empty_store_returns_zeroed_summary() {
        let store = Arc::new(MemoryStore::default());

        let summary = service(store.clone()).run(10.0, today()).await.unwrap();

        assert_eq!(summary, RebalanceSummary::empty());
        assert!(store.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flagged_portfolio_is_logged_as_pending() {
        let store = Arc::new(MemoryStore {
            allocations: vec![row(1, "Growth", "Equity", 6000.0), row(1, "Growth", "ETF", 4000.0)],
            assignments: vec![AdvisorAssignment { portfolio_id: 1, advisor_id: 42, is_primary: true, end_date: None }],
            ..Default::default()
        });

        let summary = service(store.clone()).run(10.0, today()).await.unwrap();

        assert_eq!(summary.portfolios_analysed, 1);
        assert_eq!(summary.portfolios_flagged, 1);
        assert_eq!(summary.logs_written, 1);

        let rec = &summary.recommendations[0];
        assert_eq!(rec.advisor_id, 42);
        assert_eq!(rec.status, "Pending");
        assert_eq!(rec.rebalance_date, today());
        assert_eq!(rec.flagged_classes.len(), 3);

        let log = store.log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].portfolio_id, 1);
        assert_eq!(log[0].reason, rec.reason);
    }

    #[tokio::test]
    async fn test_zero_value_and_on_target_portfolios_are_counted_but_not_logged() {
        let mut allocations = vec![row(1, "Empty", "Equity", 0.0)];
        for (class, value) in [
            ("Equity", 40.0),
            ("ETF", 25.0),
            ("Fixed Income", 15.0),
            ("Crypto", 5.0),
            ("Real Estate", 5.0),
            ("Commodity", 5.0),
            ("Other", 5.0),
        ] {
            allocations.push(row(2, "Balanced", class, value));
        }
        let store = Arc::new(MemoryStore { allocations, ..Default::default() });

        let summary = service(store.clone()).run(10.0, today()).await.unwrap();

        assert_eq!(summary.portfolios_analysed, 2);
        assert_eq!(summary.portfolios_flagged, 0);
        assert_eq!(summary.logs_written, 0);
        assert!(store.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_advisor_falls_back_to_default() {
        let store = Arc::new(MemoryStore {
            allocations: vec![row(1, "Growth", "Equity", 100.0), row(2, "Income", "Fixed Income", 100.0)],
            assignments: vec![AdvisorAssignment { portfolio_id: 2, advisor_id: 17, is_primary: true, end_date: None }],
            ..Default::default()
        });

        let summary = service(store).run(10.0, today()).await.unwrap();

        assert_eq!(summary.portfolios_flagged, 2);
        assert_eq!(summary.recommendations[0].portfolio_id, 1);
        assert_eq!(summary.recommendations[0].advisor_id, 1);
        assert_eq!(summary.recommendations[1].portfolio_id, 2);
        assert_eq!(summary.recommendations[1].advisor_id, 17);
    }

    #[tokio::test]
    async fn test_repeated_runs_append_duplicate_rows() {
        let store = Arc::new(MemoryStore {
            allocations: vec![row(1, "Growth", "Equity", 100.0)],
            ..Default::default()
        });
        let service = service(store.clone());

        let first = service.run(10.0, today()).await.unwrap();
        let second = service.run(10.0, today()).await.unwrap();

        assert_eq!(first.recommendations, second.recommendations);
        assert_eq!(store.log.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_read_failure_is_db_error() {
        let store = Arc::new(MemoryStore { fail_reads: true, ..Default::default() });

        let err = service(store).run(10.0, today()).await.unwrap_err();
        assert!(matches!(err, AppError::Db(sqlx::Error::PoolTimedOut)));
    }

    #[tokio::test]
    async fn test_write_failure_is_write_error() {
        let store = Arc::new(MemoryStore {
            allocations: vec![row(1, "Growth", "Equity", 100.0)],
            fail_writes: true,
            ..Default::default()
        });

        let err = service(store).run(10.0, today()).await.unwrap_err();
        assert!(matches!(err, AppError::Write(_)));
    }
}
