use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::employee::{Gender, Role};
use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum LeaveType {
        Annual => "ANNUAL",
        Sick => "SICK",
        Unpaid => "UNPAID",
        Exceptional => "EXCEPTIONAL",
        Maternity => "MATERNITY",
        Paternity => "PATERNITY",
    }
}

impl LeaveType {
    pub fn is_offered_to(&self, gender: Gender) -> bool {
        match self {
            LeaveType::Maternity => gender == Gender::Female,
            LeaveType::Paternity => gender == Gender::Male,
            _ => true,
        }
    }

    pub fn offered_to(gender: Gender) -> Vec<LeaveType> {
        LeaveType::ALL
            .iter()
            .copied()
            .filter(|leave_type| leave_type.is_offered_to(gender))
            .collect()
    }
}

string_enum! {
    /// Stored machine state. `Open` covers both "submitted" and "pending";
    /// the distinction is a display label derived from the escalation count.
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum RequestState {
        Open => "OPEN",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        Cancelled => "CANCELLED",
    }
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::Open)
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum LeaveStatus {
        Submitted => "SUBMITTED",
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        Cancelled => "CANCELLED",
    }
}

impl LeaveStatus {
    pub fn from_state(state: RequestState, escalation_count: i64) -> Self {
        match state {
            RequestState::Open if escalation_count > 0 => LeaveStatus::Pending,
            RequestState::Open => LeaveStatus::Submitted,
            RequestState::Approved => LeaveStatus::Approved,
            RequestState::Rejected => LeaveStatus::Rejected,
            RequestState::Cancelled => LeaveStatus::Cancelled,
        }
    }

    /// Requests in these statuses still consume allowance.
    pub fn is_consuming(&self) -> bool {
        matches!(
            self,
            LeaveStatus::Submitted | LeaveStatus::Pending | LeaveStatus::Approved
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LeaveStatus::Approved | LeaveStatus::Rejected | LeaveStatus::Cancelled
        )
    }

    /// Storage filter equivalent of a display status.
    pub fn state_filter(&self) -> (RequestState, Option<bool>) {
        match self {
            LeaveStatus::Submitted => (RequestState::Open, Some(false)),
            LeaveStatus::Pending => (RequestState::Open, Some(true)),
            LeaveStatus::Approved => (RequestState::Approved, None),
            LeaveStatus::Rejected => (RequestState::Rejected, None),
            LeaveStatus::Cancelled => (RequestState::Cancelled, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub state: RequestState,
    pub escalation_count: i64,
    pub current_assignee_id: Option<Uuid>,
    pub current_assignee_role: Option<Role>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn status(&self) -> LeaveStatus {
        LeaveStatus::from_state(self.state, self.escalation_count)
    }

    /// Inclusive calendar-day count.
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn is_assigned_to(&self, employee_id: Uuid) -> bool {
        self.current_assignee_id == Some(employee_id)
    }
}

/// Wire representation of a leave request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestView {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub day_count: i64,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    pub current_assignee_id: Option<Uuid>,
    pub current_assignee_role: Option<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LeaveRequest> for LeaveRequestView {
    fn from(request: LeaveRequest) -> Self {
        Self {
            status: request.status(),
            day_count: request.day_count(),
            id: request.id,
            employee_id: request.employee_id,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason,
            current_assignee_id: request.current_assignee_id,
            current_assignee_role: request.current_assignee_role,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestInput {
    #[serde(rename = "type", alias = "leaveType")]
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

/// Fully validated request ready for insertion.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub assignee_id: Uuid,
    pub assignee_role: Role,
}

/// Target of a compare-and-set transition.
#[derive(Debug, Clone)]
pub struct LeaveStateChange {
    pub state: RequestState,
    pub escalation_count: i64,
    pub current_assignee_id: Option<Uuid>,
    pub current_assignee_role: Option<Role>,
}

/// One approved leave shown on the calendar view.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CalendarLeave {
    pub request_id: Uuid,
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub department_id: Option<Uuid>,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementSummary {
    pub year: i32,
    pub base_allowance: i64,
    pub seniority_bonus_days: i64,
    pub total_annual_allowance: i64,
    pub consumed_days: i64,
    pub remaining_days: i64,
}
