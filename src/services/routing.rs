//! Declarative approval routing.
//!
//! A single table maps `(requester role, department type)` to the ordered
//! chain of approver roles. The resolver turns that chain plus the set of
//! currently eligible role holders into a concrete assignee.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::database::models::{DepartmentType, Employee, Role};
use crate::error::TransitionError;

/// What happens to leave requested by the final authority itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeoLeavePolicy {
    /// Stored and assigned to the requester, who decides on it manually.
    #[default]
    SelfAssign,
    /// Submission is refused.
    Reject,
}

impl FromStr for CeoLeavePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "self_assign" => Ok(CeoLeavePolicy::SelfAssign),
            "reject" => Ok(CeoLeavePolicy::Reject),
            other => Err(format!(
                "unknown policy '{}', expected self_assign or reject",
                other
            )),
        }
    }
}

struct RouteRule {
    requester: Role,
    // None matches any department type, including none at all
    department: Option<DepartmentType>,
    chain: &'static [Role],
}

const ROUTING_TABLE: &[RouteRule] = &[
    RouteRule {
        requester: Role::Employee,
        department: Some(DepartmentType::Operations),
        chain: &[Role::ServiceHead, Role::DeptHead, Role::Ceo],
    },
    RouteRule {
        requester: Role::Employee,
        department: Some(DepartmentType::Daf),
        chain: &[Role::Accountant, Role::Ceo],
    },
    RouteRule {
        requester: Role::Employee,
        department: None,
        chain: &[Role::DeptHead, Role::Ceo],
    },
    RouteRule {
        requester: Role::ServiceHead,
        department: None,
        chain: &[Role::DeptHead, Role::Ceo],
    },
    RouteRule {
        requester: Role::DeptHead,
        department: None,
        chain: &[Role::Ceo],
    },
    RouteRule {
        requester: Role::Accountant,
        department: None,
        chain: &[Role::Ceo],
    },
    RouteRule {
        requester: Role::Ceo,
        department: None,
        chain: &[],
    },
];

/// Ordered approver roles for a requester. The first matching rule wins.
pub fn approval_chain(requester: Role, department: Option<DepartmentType>) -> &'static [Role] {
    ROUTING_TABLE
        .iter()
        .find(|rule| {
            rule.requester == requester
                && (rule.department.is_none() || rule.department == department)
        })
        .map(|rule| rule.chain)
        .unwrap_or(&[])
}

/// Where to look for the holder of `role` on behalf of a requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolderScope {
    pub role: Role,
    pub department_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
}

impl HolderScope {
    /// `None` when the role is department-scoped and the requester has no department.
    pub fn for_requester(role: Role, requester: &Employee) -> Option<Self> {
        if role.is_org_wide() {
            return Some(Self {
                role,
                department_id: None,
                service_id: None,
            });
        }

        let department_id = requester.department_id?;
        let service_id = match role {
            Role::ServiceHead => requester.service_id,
            _ => None,
        };

        Some(Self {
            role,
            department_id: Some(department_id),
            service_id,
        })
    }
}

/// Deterministic eligible holder per role; a missing role is vacant.
pub type ApproverCandidates = HashMap<Role, Uuid>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub employee_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Copy)]
pub struct RoutingResolver {
    ceo_policy: CeoLeavePolicy,
}

impl RoutingResolver {
    pub fn new(ceo_policy: CeoLeavePolicy) -> Self {
        Self { ceo_policy }
    }

    pub fn chain_for(&self, requester: &Employee) -> &'static [Role] {
        approval_chain(requester.role, requester.department_type)
    }

    /// First chain role with an eligible holder; vacant levels are skipped.
    pub fn initial_assignment(
        &self,
        requester: &Employee,
        candidates: &ApproverCandidates,
    ) -> Result<Assignment, TransitionError> {
        if requester.role.is_final_authority() {
            return match self.ceo_policy {
                CeoLeavePolicy::SelfAssign => Ok(Assignment {
                    employee_id: requester.id,
                    role: requester.role,
                }),
                CeoLeavePolicy::Reject => Err(TransitionError::UnroutableRequester(requester.role)),
            };
        }

        let chain = self.chain_for(requester);
        chain
            .iter()
            .find_map(|role| {
                candidates.get(role).map(|employee_id| Assignment {
                    employee_id: *employee_id,
                    role: *role,
                })
            })
            .ok_or_else(|| {
                TransitionError::NoEligibleApprover(chain.last().copied().unwrap_or(Role::Ceo))
            })
    }

    /// Escalation may only move up the chain, and may only skip levels that are vacant.
    pub fn escalation(
        &self,
        requester: &Employee,
        current_role: Role,
        to_role: Role,
        candidates: &ApproverCandidates,
    ) -> Result<Assignment, TransitionError> {
        let chain = self.chain_for(requester);
        let illegal = TransitionError::IllegalEscalation {
            from: current_role,
            to: to_role,
        };

        let (Some(from_index), Some(to_index)) = (
            chain.iter().position(|role| *role == current_role),
            chain.iter().position(|role| *role == to_role),
        ) else {
            return Err(illegal);
        };

        if to_index <= from_index {
            return Err(illegal);
        }

        let skips_staffed_level = chain[from_index + 1..to_index]
            .iter()
            .any(|role| candidates.contains_key(role));
        if skips_staffed_level {
            return Err(illegal);
        }

        candidates
            .get(&to_role)
            .map(|employee_id| Assignment {
                employee_id: *employee_id,
                role: to_role,
            })
            .ok_or(TransitionError::NoEligibleApprover(to_role))
    }
}
