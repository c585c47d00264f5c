use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Target allocation, in evaluation order. Percentages sum to 100.
pub const DEFAULT_TARGET_ALLOCATIONS: [(&str, f64); 7] = [
    ("Equity", 40.0),
    ("ETF", 25.0),
    ("Fixed Income", 15.0),
    ("Crypto", 5.0),
    ("Real Estate", 5.0),
    ("Commodity", 5.0),
    ("Other", 5.0),
];

/// Percentage points of drift before an asset class is flagged.
pub const DEFAULT_DRIFT_THRESHOLD: f64 = 10.0;

/// Advisor credited when a portfolio has no active assignment.
pub const FALLBACK_ADVISOR_ID: i64 = 1;

pub const STATUS_PENDING: &str = "Pending";

/// One row of `vw_asset_allocation`: the summed value of one asset class in one portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocationRow {
    pub portfolio_id: i64,
    pub portfolio_name: String,
    pub asset_class: String,
    pub class_value: f64,
}

/// An advisor's assignment to the client owning a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorAssignment {
    pub portfolio_id: i64,
    pub advisor_id: i64,
    pub is_primary: bool,
    pub end_date: Option<NaiveDate>,
}

impl AdvisorAssignment {
    /// Assignments with no end date, or one on/after `today`, are active.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        match self.end_date {
            None => true,
            Some(end) => end >= today,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetWeight {
    pub asset_class: String,
    pub target_pct: f64,
}

/// Immutable settings for a rebalance run.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceConfig {
    pub targets: Vec<TargetWeight>,
    pub default_drift_threshold: f64,
    pub fallback_advisor_id: i64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            targets: DEFAULT_TARGET_ALLOCATIONS
                .iter()
                .map(|(asset_class, target_pct)| TargetWeight {
                    asset_class: asset_class.to_string(),
                    target_pct: *target_pct,
                })
                .collect(),
            default_drift_threshold: DEFAULT_DRIFT_THRESHOLD,
            fallback_advisor_id: FALLBACK_ADVISOR_ID,
        }
    }
}

impl RebalanceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.targets.is_empty() {
            return Err("At least one target allocation is required".to_string());
        }

        for (i, target) in self.targets.iter().enumerate() {
            if !target.target_pct.is_finite() || target.target_pct < 0.0 {
                return Err(format!(
                    "Target for {} must be a non-negative percentage",
                    target.asset_class
                ));
            }
            if self.targets[..i]
                .iter()
                .any(|t| t.asset_class == target.asset_class)
            {
                return Err(format!("Duplicate target for {}", target.asset_class));
            }
        }

        let sum: f64 = self.targets.iter().map(|t| t.target_pct).sum();
        if (sum - 100.0).abs() > 1e-9 {
            return Err(format!("Target allocations must sum to 100, got {}", sum));
        }

        if !self.default_drift_threshold.is_finite() || self.default_drift_threshold < 0.0 {
            return Err("Default drift threshold must be a non-negative number".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftEntry {
    pub target_pct: f64,
    pub actual_pct: f64,
    pub drift_pct: f64,
}

impl DriftEntry {
    pub fn is_overweight(&self) -> bool {
        self.drift_pct > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedClass {
    pub asset_class: String,
    pub entry: DriftEntry,
}

/// Flagged asset classes in target order. Serializes as a JSON object keyed by asset class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlaggedClasses(pub Vec<FlaggedClass>);

impl FlaggedClasses {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, asset_class: &str) -> Option<&DriftEntry> {
        self.0
            .iter()
            .find(|f| f.asset_class == asset_class)
            .map(|f| &f.entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlaggedClass> {
        self.0.iter()
    }
}

impl Serialize for FlaggedClasses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for flagged in &self.0 {
            map.serialize_entry(&flagged.asset_class, &flagged.entry)?;
        }
        map.end()
    }
}

/// A portfolio that drifted past the threshold, ready to be logged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub portfolio_id: i64,
    pub portfolio_name: String,
    pub total_value: f64,
    pub flagged_classes: FlaggedClasses,
    pub reason: String,
    pub advisor_id: i64,
    pub rebalance_date: NaiveDate,
    pub status: String,
}

/// Row appended to `rebalance_log`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebalanceLogEntry {
    pub portfolio_id: i64,
    pub advisor_id: i64,
    pub rebalance_date: NaiveDate,
    pub reason: String,
    pub status: String,
}

impl From<&Recommendation> for RebalanceLogEntry {
    fn from(rec: &Recommendation) -> Self {
        Self {
            portfolio_id: rec.portfolio_id,
            advisor_id: rec.advisor_id,
            rebalance_date: rec.rebalance_date,
            reason: rec.reason.clone(),
            status: rec.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebalanceSummary {
    pub portfolios_analysed: usize,
    pub portfolios_flagged: usize,
    pub logs_written: u64,
    pub recommendations: Vec<Recommendation>,
}

impl RebalanceSummary {
    pub fn empty() -> Self {
        Self {
            portfolios_analysed: 0,
            portfolios_flagged: 0,
            logs_written: 0,
            recommendations: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RebalanceQuery {
    pub drift_threshold: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_sum_to_100() {
        let config = RebalanceConfig::default();
        let sum: f64 = config.targets.iter().map(|t| t.target_pct).sum();
        assert_eq!(sum, 100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sum() {
        let mut config = RebalanceConfig::default();
        config.targets[0].target_pct = 45.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_class() {
        let config = RebalanceConfig {
            targets: vec![
                TargetWeight { asset_class: "Equity".to_string(), target_pct: 50.0 },
                TargetWeight { asset_class: "Equity".to_string(), target_pct: 50.0 },
            ],
            ..RebalanceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_assignment_active_on_end_date() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut assignment = AdvisorAssignment {
            portfolio_id: 1,
            advisor_id: 7,
            is_primary: false,
            end_date: Some(today),
        };
        assert!(assignment.is_active_on(today));

        assignment.end_date = today.pred_opt();
        assert!(!assignment.is_active_on(today));

        assignment.end_date = None;
        assert!(assignment.is_active_on(today));
    }

    #[test]
    fn test_flagged_classes_serialize_in_order() {
        let entry = DriftEntry { target_pct: 5.0, actual_pct: 0.0, drift_pct: -5.0 };
        let flagged = FlaggedClasses(vec![
            FlaggedClass { asset_class: "Fixed Income".to_string(), entry },
            FlaggedClass { asset_class: "Crypto".to_string(), entry },
        ]);
        let json = serde_json::to_string(&flagged).unwrap();
        assert!(json.starts_with("{\"Fixed Income\":"));
        assert!(json.find("Fixed Income").unwrap() < json.find("Crypto").unwrap());
    }
}
