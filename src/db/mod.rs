pub mod advisor_queries;
pub mod allocation_queries;
pub mod rebalance_log_queries;
