use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::employee::Role;
use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum DecisionType {
        Approve => "APPROVE",
        Reject => "REJECT",
        Escalate => "ESCALATE",
        Cancel => "CANCEL",
    }
}

/// Immutable ledger row. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: Uuid,
    pub leave_request_id: Uuid,
    pub decision_type: DecisionType,
    pub actor_id: Uuid,
    pub target_employee_id: Option<Uuid>,
    pub target_role: Option<Role>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDecision {
    pub leave_request_id: Uuid,
    pub decision_type: DecisionType,
    pub actor_id: Uuid,
    pub target_employee_id: Option<Uuid>,
    pub target_role: Option<Role>,
    pub comment: Option<String>,
}
