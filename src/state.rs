use std::sync::Arc;

use crate::models::RebalanceConfig;
use crate::store::RebalanceStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RebalanceStore>,
    pub rebalance_config: Arc<RebalanceConfig>,
}
