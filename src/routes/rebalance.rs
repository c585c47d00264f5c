use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{RebalanceQuery, RebalanceSummary};
use crate::services::rebalance_service::RebalanceService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(recommend_rebalance))
}

/// POST /rebalance
///
/// Score every portfolio's asset-class drift against the target allocation
/// and append a `Pending` rebalance log entry for each portfolio with a class
/// drifting more than `drift_threshold` percentage points.
///
/// # Query Parameters
/// - `drift_threshold`: percentage points, non-negative (default: 10.0)
///
/// # Example
/// ```text
/// POST /rebalance?drift_threshold=7.5
/// ```
#[axum::debug_handler]
pub async fn recommend_rebalance(
    State(state): State<AppState>,
    query: Result<Query<RebalanceQuery>, QueryRejection>,
) -> Result<Json<RebalanceSummary>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    let drift_threshold = query
        .drift_threshold
        .unwrap_or(state.rebalance_config.default_drift_threshold);

    if !drift_threshold.is_finite() || drift_threshold < 0.0 {
        return Err(AppError::Validation(
            "drift_threshold must be a non-negative number".to_string(),
        ));
    }

    info!("POST /rebalance - drift_threshold={}", drift_threshold);

    let today = chrono::Local::now().date_naive();
    let service = RebalanceService::new(state.store.clone(), state.rebalance_config.clone());

    let summary = service.run(drift_threshold, today).await.map_err(|e| {
        error!("Rebalance analysis failed: {}", e);
        e
    })?;

    Ok(Json(summary))
}
