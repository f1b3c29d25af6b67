use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum BlackoutScopeKind {
        Global => "GLOBAL",
        Department => "DEPARTMENT",
        Employees => "EMPLOYEES",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlackoutScope {
    Global,
    #[serde(rename_all = "camelCase")]
    Department { department_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Employees { employee_ids: Vec<Uuid> },
}

impl BlackoutScope {
    pub fn kind(&self) -> BlackoutScopeKind {
        match self {
            BlackoutScope::Global => BlackoutScopeKind::Global,
            BlackoutScope::Department { .. } => BlackoutScopeKind::Department,
            BlackoutScope::Employees { .. } => BlackoutScopeKind::Employees,
        }
    }

    pub fn applies_to(&self, employee_id: Uuid, department_id: Option<Uuid>) -> bool {
        match self {
            BlackoutScope::Global => true,
            BlackoutScope::Department { department_id: scoped } => department_id == Some(*scoped),
            BlackoutScope::Employees { employee_ids } => employee_ids.contains(&employee_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlackoutPeriod {
    pub id: Uuid,
    pub title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub scope: BlackoutScope,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl BlackoutPeriod {
    pub fn overlaps(&self, start_date: NaiveDate, end_date: NaiveDate) -> bool {
        start_date <= self.end_date && end_date >= self.start_date
    }
}

/// Raw `blackout_periods` row; the employee set lives in a join table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BlackoutPeriodRow {
    pub id: Uuid,
    pub title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub scope: BlackoutScopeKind,
    pub department_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl BlackoutPeriodRow {
    pub fn into_period(self, employee_ids: Vec<Uuid>) -> Result<BlackoutPeriod, String> {
        let scope = match self.scope {
            BlackoutScopeKind::Global => BlackoutScope::Global,
            BlackoutScopeKind::Department => BlackoutScope::Department {
                department_id: self
                    .department_id
                    .ok_or_else(|| format!("Blackout period {} has no department", self.id))?,
            },
            BlackoutScopeKind::Employees => BlackoutScope::Employees { employee_ids },
        };

        Ok(BlackoutPeriod {
            id: self.id,
            title: self.title,
            start_date: self.start_date,
            end_date: self.end_date,
            scope,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackoutPeriodInput {
    pub title: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub scope: BlackoutScope,
}
