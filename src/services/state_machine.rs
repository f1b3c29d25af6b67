//! Leave request lifecycle.
//!
//! ```text
//! OPEN (SUBMITTED | PENDING) --approve--> APPROVED
//!                            --reject---> REJECTED
//!                            --cancel---> CANCELLED   (requester only)
//!                            --escalate-> OPEN (PENDING, new assignee)
//! ```
//!
//! Terminal states accept nothing. Guards are evaluated against a snapshot;
//! the repository's compare-and-set makes the write conditional on that
//! snapshot still being current.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    Decision, DecisionType, LeaveRequest, LeaveStateChange, LeaveStatus, RequestState, Role,
};
use crate::error::TransitionError;
use crate::services::auth::Actor;
use crate::services::routing::Assignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveAction {
    Approve,
    Reject,
    #[serde(rename_all = "camelCase")]
    Escalate {
        to_role: Role,
    },
    Cancel,
}

/// Checks who may perform `action` on `request` in its current state.
pub fn authorize(
    request: &LeaveRequest,
    actor: &Actor,
    action: &LeaveAction,
    final_authority_override: bool,
) -> Result<(), TransitionError> {
    if request.state.is_terminal() {
        return Err(TransitionError::TerminalState(request.status()));
    }

    let is_assignee = request.is_assigned_to(actor.employee_id);

    match action {
        LeaveAction::Cancel if actor.employee_id != request.employee_id => {
            Err(TransitionError::NotRequester)
        }
        LeaveAction::Cancel => Ok(()),
        LeaveAction::Approve | LeaveAction::Reject
            if is_assignee || (final_authority_override && actor.role.is_final_authority()) =>
        {
            Ok(())
        }
        LeaveAction::Escalate { .. } if is_assignee => Ok(()),
        _ => Err(TransitionError::NotAssignee),
    }
}

/// An authorized action with its escalation target already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Approve,
    Reject,
    Cancel,
    Escalate(Assignment),
}

impl Transition {
    pub fn decision_type(&self) -> DecisionType {
        match self {
            Transition::Approve => DecisionType::Approve,
            Transition::Reject => DecisionType::Reject,
            Transition::Cancel => DecisionType::Cancel,
            Transition::Escalate(_) => DecisionType::Escalate,
        }
    }

    pub fn target(&self) -> Option<Assignment> {
        match self {
            Transition::Escalate(target) => Some(*target),
            _ => None,
        }
    }
}

/// State that results from applying `transition` to `request`.
pub fn next_state(request: &LeaveRequest, transition: &Transition) -> LeaveStateChange {
    let closed = |state| LeaveStateChange {
        state,
        escalation_count: request.escalation_count,
        current_assignee_id: None,
        current_assignee_role: None,
    };

    match transition {
        Transition::Approve => closed(RequestState::Approved),
        Transition::Reject => closed(RequestState::Rejected),
        Transition::Cancel => closed(RequestState::Cancelled),
        Transition::Escalate(target) => LeaveStateChange {
            state: RequestState::Open,
            escalation_count: request.escalation_count + 1,
            current_assignee_id: Some(target.employee_id),
            current_assignee_role: Some(target.role),
        },
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("decision {decision_id} follows terminal status {status}")]
    DecisionAfterTerminal {
        decision_id: Uuid,
        status: LeaveStatus,
    },
}

/// Rebuilds a request's status from its ordered decision ledger.
pub fn replay(decisions: &[Decision]) -> Result<LeaveStatus, ReplayError> {
    decisions
        .iter()
        .try_fold(LeaveStatus::Submitted, |status, decision| {
            if status.is_terminal() {
                return Err(ReplayError::DecisionAfterTerminal {
                    decision_id: decision.id,
                    status,
                });
            }
            Ok(match decision.decision_type {
                DecisionType::Approve => LeaveStatus::Approved,
                DecisionType::Reject => LeaveStatus::Rejected,
                DecisionType::Cancel => LeaveStatus::Cancelled,
                DecisionType::Escalate => LeaveStatus::Pending,
            })
        })
}
