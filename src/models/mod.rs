pub mod rebalance;

pub use rebalance::{
    AdvisorAssignment, AssetAllocationRow, DriftEntry, FlaggedClass, FlaggedClasses,
    RebalanceConfig, RebalanceLogEntry, RebalanceQuery, RebalanceSummary, Recommendation,
    TargetWeight,
};
