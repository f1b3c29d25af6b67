//! Submission and decision orchestration over the pure engine components.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::config::LeavePolicy;
use crate::database::DatabaseTransaction;
use crate::database::models::{
    EntitlementSummary, Employee, LeaveRequest, LeaveRequestInput, LeaveStatus, LeaveType,
    NewDecision, NewLeaveRequest, Role,
};
use crate::database::repositories::{blackout, decision, employee, leave_request};
use crate::error::{AppError, ValidationError};
use crate::handlers::shared::{Page, Paginated};
use crate::services::auth::Actor;
use crate::services::blackout::check_blackouts;
use crate::services::entitlement::{EntitlementCalculator, days_by_year};
use crate::services::ledger::DecisionLedger;
use crate::services::routing::{Assignment, RoutingResolver};
use crate::services::state_machine::{self, LeaveAction, Transition};

async fn load_employee(
    conn: &mut SqliteConnection,
    employee_id: Uuid,
) -> Result<Employee, AppError> {
    employee::find_by_id(conn, employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Employee {} not found", employee_id)))
}

async fn load_request(
    conn: &mut SqliteConnection,
    request_id: Uuid,
) -> Result<LeaveRequest, AppError> {
    leave_request::find_by_id(conn, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Leave request {} not found", request_id)))
}

#[derive(Clone)]
pub struct LeaveService {
    pool: SqlitePool,
    policy: LeavePolicy,
    routing: RoutingResolver,
}

impl LeaveService {
    pub fn new(pool: SqlitePool, policy: LeavePolicy) -> Self {
        let routing = RoutingResolver::new(policy.ceo_leave_policy);
        Self {
            pool,
            policy,
            routing,
        }
    }

    /// Validates and files a request for `actor`.
    ///
    /// Balance, blackout and routing checks all run inside one write
    /// transaction, so a concurrent submission by the same employee sees
    /// this request's row before computing its own balance.
    pub async fn submit(
        &self,
        actor: Actor,
        input: LeaveRequestInput,
    ) -> Result<LeaveRequest, AppError> {
        if input.end_date < input.start_date {
            return Err(ValidationError::InvalidRange {
                start: input.start_date,
                end: input.end_date,
            }
            .into());
        }

        let policy = self.policy.clone();
        let routing = self.routing;
        let today = Utc::now().date_naive();

        let created = DatabaseTransaction::run(&self.pool, move |conn| {
            Box::pin(async move {
                let requester = load_employee(&mut *conn, actor.employee_id).await?;
                if !requester.is_active() {
                    return Err(AppError::Forbidden(
                        "Inactive employees cannot request leave".to_string(),
                    ));
                }
                if !input.leave_type.is_offered_to(requester.gender) {
                    return Err(ValidationError::InvalidLeaveType {
                        leave_type: input.leave_type,
                    }
                    .into());
                }

                let existing = leave_request::find_all_for_employee(&mut *conn, requester.id).await?;
                let calculator = EntitlementCalculator::new(&policy);
                for (year, requested) in days_by_year(input.start_date, input.end_date) {
                    let summary = calculator.calculate(&requester, year, &existing, today);
                    if requested > summary.remaining_days {
                        return Err(ValidationError::InsufficientBalance {
                            year,
                            requested,
                            remaining: summary.remaining_days,
                        }
                        .into());
                    }
                }

                let periods =
                    blackout::overlapping(&mut *conn, input.start_date, input.end_date).await?;
                let check = check_blackouts(
                    input.start_date,
                    input.end_date,
                    requester.id,
                    requester.department_id,
                    &periods,
                );
                if check.blocked {
                    return Err(ValidationError::BlackoutConflict {
                        periods: check.conflict_ids(),
                    }
                    .into());
                }

                let chain = routing.chain_for(&requester);
                let candidates = employee::approver_candidates(&mut *conn, &requester, chain).await?;
                let assignment = routing.initial_assignment(&requester, &candidates)?;

                let request = NewLeaveRequest {
                    employee_id: requester.id,
                    leave_type: input.leave_type,
                    start_date: input.start_date,
                    end_date: input.end_date,
                    reason: input.reason,
                    assignee_id: assignment.employee_id,
                    assignee_role: assignment.role,
                };

                Ok(leave_request::insert(&mut *conn, &request).await?)
            })
        })
        .await?;

        log::info!(
            "Leave request {} submitted by {} ({} day(s), assigned to {} as {})",
            created.id,
            created.employee_id,
            created.day_count(),
            created.current_assignee_id.unwrap_or_default(),
            created
                .current_assignee_role
                .map(|role| role.to_string())
                .unwrap_or_default()
        );

        Ok(created)
    }

    /// Loads the request and applies `action` to its current state.
    pub async fn decide(
        &self,
        request_id: Uuid,
        actor: Actor,
        action: LeaveAction,
        comment: Option<String>,
    ) -> Result<LeaveRequest, AppError> {
        let snapshot = {
            let mut conn = self.pool.acquire().await?;
            load_request(&mut conn, request_id).await?
        };

        self.apply_decision(snapshot, actor, action, comment).await
    }

    /// Applies `action` against `snapshot`. The write only lands if the
    /// stored request is still at the snapshot's version; otherwise the
    /// caller receives a retryable conflict and nothing is written.
    pub async fn apply_decision(
        &self,
        snapshot: LeaveRequest,
        actor: Actor,
        action: LeaveAction,
        comment: Option<String>,
    ) -> Result<LeaveRequest, AppError> {
        state_machine::authorize(
            &snapshot,
            &actor,
            &action,
            self.policy.final_authority_override,
        )?;

        let transition = match action {
            LeaveAction::Approve => Transition::Approve,
            LeaveAction::Reject => Transition::Reject,
            LeaveAction::Cancel => Transition::Cancel,
            LeaveAction::Escalate { to_role } => {
                Transition::Escalate(self.resolve_escalation(&snapshot, to_role).await?)
            }
        };

        let change = state_machine::next_state(&snapshot, &transition);
        let target = transition.target();
        let entry = NewDecision {
            leave_request_id: snapshot.id,
            decision_type: transition.decision_type(),
            actor_id: actor.employee_id,
            target_employee_id: target.map(|target| target.employee_id),
            target_role: target.map(|target| target.role),
            comment,
        };
        let request_id = snapshot.id;
        let expected_version = snapshot.version;

        let updated = DatabaseTransaction::run(&self.pool, move |conn| {
            Box::pin(async move {
                let applied =
                    leave_request::compare_and_set(&mut *conn, request_id, expected_version, &change)
                        .await?;
                if !applied {
                    log::warn!(
                        "Decision on leave request {} lost a race at version {}",
                        request_id,
                        expected_version
                    );
                    return Err(AppError::Conflict(format!(
                        "Leave request {} changed since it was read",
                        request_id
                    )));
                }

                DecisionLedger::append(&mut *conn, &entry).await?;
                load_request(&mut *conn, request_id).await
            })
        })
        .await?;

        log::info!(
            "Leave request {} is now {} after {} by {}",
            updated.id,
            updated.status(),
            transition.decision_type(),
            actor.employee_id
        );

        Ok(updated)
    }

    async fn resolve_escalation(
        &self,
        snapshot: &LeaveRequest,
        to_role: Role,
    ) -> Result<Assignment, AppError> {
        let current_role = snapshot.current_assignee_role.ok_or_else(|| {
            AppError::internal_server_error_message(format!(
                "Open leave request {} has no assignee role",
                snapshot.id
            ))
        })?;

        let mut conn = self.pool.acquire().await?;
        let requester = load_employee(&mut conn, snapshot.employee_id).await?;
        let candidates =
            employee::approver_candidates(&mut conn, &requester, self.routing.chain_for(&requester))
                .await?;

        Ok(self
            .routing
            .escalation(&requester, current_role, to_role, &candidates)?)
    }

    /// A request is visible to its requester, its current assignee, anyone
    /// who has decided on it and the final authority.
    pub async fn get(&self, request_id: Uuid, actor: Actor) -> Result<LeaveRequest, AppError> {
        let mut conn = self.pool.acquire().await?;
        let request = load_request(&mut conn, request_id).await?;

        let visible = actor.role.is_final_authority()
            || request.employee_id == actor.employee_id
            || request.is_assigned_to(actor.employee_id)
            || decision::has_actor_decided(&mut conn, request_id, actor.employee_id).await?;

        if !visible {
            return Err(AppError::Forbidden(
                "You are not involved in this leave request".to_string(),
            ));
        }

        Ok(request)
    }

    pub async fn list_mine(
        &self,
        actor: Actor,
        status: Option<LeaveStatus>,
        page: Page,
    ) -> Result<Paginated<LeaveRequest>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let (requests, total) =
            leave_request::list_for_employee(&mut conn, actor.employee_id, status, page).await?;

        Ok(Paginated::new(requests, page, total))
    }

    /// Open requests waiting on `actor`.
    pub async fn inbox(&self, actor: Actor, page: Page) -> Result<Paginated<LeaveRequest>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let (requests, total) = leave_request::list_inbox(&mut conn, actor.employee_id, page).await?;

        Ok(Paginated::new(requests, page, total))
    }

    pub async fn entitlement(
        &self,
        employee_id: Uuid,
        year: i32,
    ) -> Result<EntitlementSummary, AppError> {
        let mut conn = self.pool.acquire().await?;
        let employee = load_employee(&mut conn, employee_id).await?;
        let requests = leave_request::find_all_for_employee(&mut conn, employee_id).await?;

        Ok(EntitlementCalculator::new(&self.policy).calculate(
            &employee,
            year,
            &requests,
            Utc::now().date_naive(),
        ))
    }

    pub async fn offerable_leave_types(&self, employee_id: Uuid) -> Result<Vec<LeaveType>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let employee = load_employee(&mut conn, employee_id).await?;

        Ok(LeaveType::offered_to(employee.gender))
    }
}

