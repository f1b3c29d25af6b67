use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum Role {
        Employee => "EMPLOYEE",
        ServiceHead => "SERVICE_HEAD",
        DeptHead => "DEPT_HEAD",
        Accountant => "ACCOUNTANT",
        Ceo => "CEO",
    }
}

impl Role {
    /// The final authority: owns blackout administration and never escalates.
    pub fn is_final_authority(&self) -> bool {
        matches!(self, Role::Ceo)
    }

    /// Holders of organisation-wide roles are not looked up per department.
    pub fn is_org_wide(&self) -> bool {
        matches!(self, Role::Ceo)
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum DepartmentType {
        Daf => "DAF",
        Dsi => "DSI",
        Operations => "OPERATIONS",
        Others => "OTHERS",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum Gender {
        Male => "MALE",
        Female => "FEMALE",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum EmployeeStatus {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
    }
}

/// Employee record joined with its department type. Owned by the
/// provisioning service; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub department_id: Option<Uuid>,
    pub department_type: Option<DepartmentType>,
    pub service_id: Option<Uuid>,
    pub gender: Gender,
    pub hire_date: NaiveDate,
    pub base_allowance: Option<i64>,
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// Stored allowance, falling back to the configured default.
    pub fn base_allowance_or(&self, default_allowance: i64) -> i64 {
        self.base_allowance.unwrap_or(default_allowance)
    }
}
