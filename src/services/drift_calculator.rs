use std::collections::BTreeMap;

use crate::models::{AssetAllocationRow, DriftEntry, FlaggedClass, FlaggedClasses, RebalanceConfig};

/// All allocation rows of one portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioAllocation {
    pub portfolio_id: i64,
    pub portfolio_name: String,
    pub classes: Vec<(String, f64)>,
}

impl PortfolioAllocation {
    pub fn total_value(&self) -> f64 {
        self.classes.iter().map(|(_, value)| value).sum()
    }

    fn class_value(&self, asset_class: &str) -> f64 {
        self.classes
            .iter()
            .filter(|(class, _)| class == asset_class)
            .map(|(_, value)| value)
            .sum()
    }
}

/// Outcome for a portfolio that has at least one class past the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftAssessment {
    pub total_value: f64,
    pub flagged: FlaggedClasses,
    pub reason: String,
}

/// Group rows by portfolio id, ascending. The name is taken from the first row seen.
pub fn group_by_portfolio(rows: &[AssetAllocationRow]) -> Vec<PortfolioAllocation> {
    let mut grouped: BTreeMap<i64, PortfolioAllocation> = BTreeMap::new();

    for row in rows {
        grouped
            .entry(row.portfolio_id)
            .or_insert_with(|| PortfolioAllocation {
                portfolio_id: row.portfolio_id,
                portfolio_name: row.portfolio_name.clone(),
                classes: Vec::new(),
            })
            .classes
            .push((row.asset_class.clone(), row.class_value));
    }

    grouped.into_values().collect()
}

/// Drift of every target class, in target order. `None` when the portfolio has no value.
///
/// Classes held but absent from the targets still count toward the total.
pub fn compute_drift(
    allocation: &PortfolioAllocation,
    config: &RebalanceConfig,
) -> Option<Vec<FlaggedClass>> {
    let total_value = allocation.total_value();
    if total_value <= 0.0 {
        return None;
    }

    let entries = config
        .targets
        .iter()
        .map(|target| {
            let actual_pct = allocation.class_value(&target.asset_class) / total_value * 100.0;
            FlaggedClass {
                asset_class: target.asset_class.clone(),
                entry: DriftEntry {
                    target_pct: round2(target.target_pct),
                    actual_pct: round2(actual_pct),
                    drift_pct: round2(actual_pct - target.target_pct),
                },
            }
        })
        .collect();

    Some(entries)
}

/// Assess one portfolio against the targets. `None` means nothing to recommend.
pub fn assess_portfolio(
    allocation: &PortfolioAllocation,
    config: &RebalanceConfig,
    drift_threshold: f64,
) -> Option<DriftAssessment> {
    let entries = compute_drift(allocation, config)?;

    // Compared on the rounded drift, strictly.
    let flagged = FlaggedClasses(
        entries
            .into_iter()
            .filter(|f| f.entry.drift_pct.abs() > drift_threshold)
            .collect(),
    );

    if flagged.is_empty() {
        return None;
    }

    let reason = build_reason(&flagged);

    Some(DriftAssessment {
        total_value: round2(allocation.total_value()),
        flagged,
        reason,
    })
}

pub fn build_reason(flagged: &FlaggedClasses) -> String {
    let parts: Vec<String> = flagged
        .iter()
        .map(|f| {
            let direction = if f.entry.is_overweight() { "overweight" } else { "underweight" };
            format!(
                "{} is {} at {:.1}% (target {:.1}%, drift {:+.1}%)",
                f.asset_class, direction, f.entry.actual_pct, f.entry.target_pct, f.entry.drift_pct
            )
        })
        .collect();

    format!("Rebalancing required — {}.", parts.join("; "))
}

/// Two decimals, exact halves to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
