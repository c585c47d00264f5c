pub mod advisor_resolver;
pub mod drift_calculator;
pub mod rebalance_service;
