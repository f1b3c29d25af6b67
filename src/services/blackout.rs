use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::BlackoutPeriod;

/// Outcome of checking a candidate range against blackout periods.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackoutCheck {
    pub blocked: bool,
    pub conflicts: Vec<BlackoutPeriod>,
}

impl BlackoutCheck {
    pub fn conflict_ids(&self) -> Vec<Uuid> {
        self.conflicts.iter().map(|period| period.id).collect()
    }
}

/// A period blocks when its scope covers the requester and its dates overlap
/// `[start_date, end_date]`. Evaluated at submission only; existing approvals
/// are never revisited.
pub fn check_blackouts(
    start_date: NaiveDate,
    end_date: NaiveDate,
    employee_id: Uuid,
    department_id: Option<Uuid>,
    periods: &[BlackoutPeriod],
) -> BlackoutCheck {
    let conflicts: Vec<BlackoutPeriod> = periods
        .iter()
        .filter(|period| period.scope.applies_to(employee_id, department_id))
        .filter(|period| period.overlaps(start_date, end_date))
        .cloned()
        .collect();

    BlackoutCheck {
        blocked: !conflicts.is_empty(),
        conflicts,
    }
}
