use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::AdvisorAssignment;

/// Pick one advisor per portfolio from its assignments active on `today`.
///
/// A primary assignment wins; otherwise the first active row seen for the
/// portfolio is kept. Portfolios with no active assignment are left out of the
/// map and the caller applies its fallback advisor.
pub fn resolve_advisors(assignments: &[AdvisorAssignment], today: NaiveDate) -> HashMap<i64, i64> {
    let mut chosen: HashMap<i64, (i64, bool)> = HashMap::new();

    for assignment in assignments.iter().filter(|a| a.is_active_on(today)) {
        chosen
            .entry(assignment.portfolio_id)
            .and_modify(|(advisor_id, is_primary)| {
                if !*is_primary && assignment.is_primary {
                    *advisor_id = assignment.advisor_id;
                    *is_primary = true;
                }
            })
            .or_insert((assignment.advisor_id, assignment.is_primary));
    }

    chosen
        .into_iter()
        .map(|(portfolio_id, (advisor_id, _))| (portfolio_id, advisor_id))
        .collect()
}
