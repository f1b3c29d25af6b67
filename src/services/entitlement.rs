//! Annual leave entitlement: base allowance, seniority bonus and the
//! per-year balance derived from an employee's request history.
//!
//! Everything here is pure. Callers gating an irreversible decision must pass
//! a freshly loaded request list.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::LeavePolicy;
use crate::database::models::{EntitlementSummary, Employee, LeaveRequest};

/// Bonus days granted from `min_years` of completed service onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeniorityTier {
    pub min_years: i64,
    pub bonus_days: i64,
}

/// Monotonically non-decreasing step function from years of service to bonus days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeniorityTable {
    tiers: Vec<SeniorityTier>,
}

impl SeniorityTable {
    pub fn new(mut tiers: Vec<SeniorityTier>) -> Result<Self, String> {
        tiers.sort_by_key(|tier| tier.min_years);

        for tier in &tiers {
            if tier.min_years < 0 || tier.bonus_days < 0 {
                return Err(format!(
                    "tier {}:{} must not be negative",
                    tier.min_years, tier.bonus_days
                ));
            }
        }

        for pair in tiers.windows(2) {
            if pair[0].min_years == pair[1].min_years {
                return Err(format!("duplicate tier for {} years", pair[0].min_years));
            }
            if pair[1].bonus_days < pair[0].bonus_days {
                return Err(format!(
                    "bonus decreases from {} to {} days at {} years",
                    pair[0].bonus_days, pair[1].bonus_days, pair[1].min_years
                ));
            }
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[SeniorityTier] {
        &self.tiers
    }

    pub fn bonus_for(&self, years_of_service: i64) -> i64 {
        self.tiers
            .iter()
            .take_while(|tier| tier.min_years <= years_of_service)
            .last()
            .map_or(0, |tier| tier.bonus_days)
    }
}

impl Default for SeniorityTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                SeniorityTier { min_years: 5, bonus_days: 2 },
                SeniorityTier { min_years: 10, bonus_days: 4 },
                SeniorityTier { min_years: 15, bonus_days: 6 },
            ],
        }
    }
}

/// Parses `years:bonus` pairs separated by commas, e.g. `5:2,10:4`.
impl FromStr for SeniorityTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tiers = Vec::new();

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (years, bonus) = entry
                .split_once(':')
                .ok_or_else(|| format!("expected years:bonus, got '{}'", entry))?;
            let min_years = years
                .trim()
                .parse()
                .map_err(|_| format!("invalid years in '{}'", entry))?;
            let bonus_days = bonus
                .trim()
                .parse()
                .map_err(|_| format!("invalid bonus in '{}'", entry))?;
            tiers.push(SeniorityTier {
                min_years,
                bonus_days,
            });
        }

        SeniorityTable::new(tiers)
    }
}

/// Completed years of service: floor(days / 365.25).
pub fn years_of_service(hire_date: NaiveDate, as_of: NaiveDate) -> i64 {
    let days = (as_of - hire_date).num_days();
    if days <= 0 {
        return 0;
    }
    // 365.25 days == 1461 / 4
    days * 4 / 1461
}

/// Days of the inclusive range `[start, end]` that fall within calendar `year`.
pub fn overlap_days(start: NaiveDate, end: NaiveDate, year: i32) -> i64 {
    let (Some(year_start), Some(year_end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        return 0;
    };

    let from = start.max(year_start);
    let to = end.min(year_end);
    if to < from {
        0
    } else {
        (to - from).num_days() + 1
    }
}

/// Splits an inclusive range into `(year, days)` pairs, one per calendar year touched.
pub fn days_by_year(start: NaiveDate, end: NaiveDate) -> Vec<(i32, i64)> {
    if end < start {
        return Vec::new();
    }
    (start.year()..=end.year())
        .map(|year| (year, overlap_days(start, end, year)))
        .filter(|(_, days)| *days > 0)
        .collect()
}

/// Sum of overlap with `year` over requests that are not void.
pub fn consumed_days(requests: &[LeaveRequest], year: i32) -> i64 {
    requests
        .iter()
        .filter(|request| request.status().is_consuming())
        .map(|request| overlap_days(request.start_date, request.end_date, year))
        .sum()
}

#[derive(Debug, Clone, Copy)]
pub struct EntitlementCalculator<'a> {
    policy: &'a LeavePolicy,
}

impl<'a> EntitlementCalculator<'a> {
    pub fn new(policy: &'a LeavePolicy) -> Self {
        Self { policy }
    }

    pub fn calculate(
        &self,
        employee: &Employee,
        year: i32,
        requests: &[LeaveRequest],
        today: NaiveDate,
    ) -> EntitlementSummary {
        let base_allowance = employee.base_allowance_or(self.policy.default_base_allowance);
        let seniority_bonus_days = self
            .policy
            .seniority
            .bonus_for(years_of_service(employee.hire_date, today));
        let total_annual_allowance = base_allowance + seniority_bonus_days;
        let consumed_days = consumed_days(requests, year);

        EntitlementSummary {
            year,
            base_allowance,
            seniority_bonus_days,
            total_annual_allowance,
            consumed_days,
            remaining_days: (total_annual_allowance - consumed_days).max(0),
        }
    }
}
