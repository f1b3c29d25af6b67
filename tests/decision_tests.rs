use pretty_assertions::assert_eq;

use leave_portal::config::LeavePolicy;
use leave_portal::database::models::{DecisionType, DepartmentType, LeaveStatus, LeaveType, Role};
use leave_portal::database::repositories::DecisionFilter;
use leave_portal::error::{AppError, TransitionError};
use leave_portal::handlers::shared::Page;
use leave_portal::services::state_machine::LeaveAction;

mod common;
use common::{EmployeeSeed, Org, TestAssertions, TestContext, date, insert_department, leave_input};

async fn submit_for(ctx: &TestContext, actor: leave_portal::services::Actor) -> uuid::Uuid {
    ctx.leave
        .submit(
            actor,
            leave_input(LeaveType::Annual, date(2031, 10, 6), date(2031, 10, 8)),
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn assignee_approves_and_ledger_records_it() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.dsi_employee).await;

    let approved = ctx
        .leave
        .decide(
            id,
            org.dsi_dept_head,
            LeaveAction::Approve,
            Some("Enjoy".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(approved.status(), LeaveStatus::Approved);
    assert_eq!(approved.current_assignee_id, None);
    assert_eq!(approved.version, 1);

    let history = ctx.ledger.history(id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].decision_type, DecisionType::Approve);
    assert_eq!(history[0].actor_id, org.dsi_dept_head.employee_id);
    assert_eq!(history[0].comment.as_deref(), Some("Enjoy"));
}

#[tokio::test]
async fn only_the_assignee_may_decide() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.ops_employee).await;

    let err = ctx
        .leave
        .decide(id, org.ops_dept_head, LeaveAction::Approve, None)
        .await
        .unwrap_err();

    TestAssertions::assert_error_code(&err, "NOT_ASSIGNEE");
    assert_eq!(err.category(), "authorization");
    TestAssertions::assert_record_count(ctx.pool(), "leave_decisions", 0).await;
}

#[tokio::test]
async fn terminal_requests_reject_further_decisions() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.dsi_employee).await;

    let rejected = ctx
        .leave
        .decide(id, org.dsi_dept_head, LeaveAction::Reject, None)
        .await
        .unwrap();

    for (actor, action) in [
        (org.dsi_dept_head, LeaveAction::Approve),
        (org.dsi_employee, LeaveAction::Cancel),
        (org.ceo, LeaveAction::Approve),
    ] {
        let err = ctx.leave.decide(id, actor, action, None).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Transition(TransitionError::TerminalState(LeaveStatus::Rejected))
        ));
    }

    let stored = ctx.leave.get(id, org.dsi_employee).await.unwrap();
    assert_eq!(stored, rejected);
    TestAssertions::assert_record_count(ctx.pool(), "leave_decisions", 1).await;
}

#[tokio::test]
async fn escalation_cannot_jump_over_a_staffed_level() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.ops_employee).await;

    let err = ctx
        .leave
        .decide(
            id,
            org.ops_service_head,
            LeaveAction::Escalate { to_role: Role::Ceo },
            None,
        )
        .await
        .unwrap_err();
    TestAssertions::assert_error_code(&err, "ILLEGAL_ESCALATION");

    let err = ctx
        .leave
        .decide(
            id,
            org.ops_service_head,
            LeaveAction::Escalate {
                to_role: Role::Accountant,
            },
            None,
        )
        .await
        .unwrap_err();
    TestAssertions::assert_error_code(&err, "ILLEGAL_ESCALATION");

    let pending = ctx
        .leave
        .decide(
            id,
            org.ops_service_head,
            LeaveAction::Escalate {
                to_role: Role::DeptHead,
            },
            Some("Needs department sign-off".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(pending.status(), LeaveStatus::Pending);
    assert_eq!(pending.current_assignee_id, Some(org.ops_dept_head.employee_id));
    assert_eq!(pending.escalation_count, 1);

    let at_ceo = ctx
        .leave
        .decide(
            id,
            org.ops_dept_head,
            LeaveAction::Escalate { to_role: Role::Ceo },
            None,
        )
        .await
        .unwrap();
    assert_eq!(at_ceo.current_assignee_id, Some(org.ceo.employee_id));
    assert_eq!(at_ceo.escalation_count, 2);

    let approved = ctx
        .leave
        .decide(id, org.ceo, LeaveAction::Approve, None)
        .await
        .unwrap();
    assert_eq!(approved.status(), LeaveStatus::Approved);

    let kinds: Vec<DecisionType> = ctx
        .ledger
        .history(id)
        .await
        .unwrap()
        .into_iter()
        .map(|decision| decision.decision_type)
        .collect();
    assert_eq!(
        kinds,
        vec![DecisionType::Escalate, DecisionType::Escalate, DecisionType::Approve]
    );
    assert_eq!(ctx.ledger.replay_status(id).await.unwrap(), LeaveStatus::Approved);
}

#[tokio::test]
async fn escalation_to_a_vacant_role_is_refused() {
    let ctx = TestContext::new().await.unwrap();
    let pool = ctx.pool();
    let dsi = insert_department(pool, DepartmentType::Dsi).await;
    let dept_head = EmployeeSeed::new(Role::DeptHead, Some(dsi)).insert(pool).await;
    let employee = EmployeeSeed::new(Role::Employee, Some(dsi)).insert(pool).await;
    let id = submit_for(&ctx, employee).await;

    let err = ctx
        .leave
        .decide(id, dept_head, LeaveAction::Escalate { to_role: Role::Ceo }, None)
        .await
        .unwrap_err();

    TestAssertions::assert_error_code(&err, "NO_ELIGIBLE_APPROVER");
    let stored = ctx.leave.get(id, employee).await.unwrap();
    assert_eq!(stored.status(), LeaveStatus::Submitted);
    assert_eq!(stored.version, 0);
}

#[tokio::test]
async fn only_the_requester_may_cancel() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.dsi_employee).await;

    let err = ctx
        .leave
        .decide(id, org.dsi_dept_head, LeaveAction::Cancel, None)
        .await
        .unwrap_err();
    TestAssertions::assert_error_code(&err, "NOT_REQUESTER");

    let cancelled = ctx
        .leave
        .decide(id, org.dsi_employee, LeaveAction::Cancel, None)
        .await
        .unwrap();
    assert_eq!(cancelled.status(), LeaveStatus::Cancelled);

    // Cancelled leave no longer consumes allowance.
    let summary = ctx
        .leave
        .entitlement(org.dsi_employee.employee_id, 2031)
        .await
        .unwrap();
    assert_eq!(summary.consumed_days, 0);
}

#[tokio::test]
async fn final_authority_override_is_configurable() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.dsi_employee).await;

    let err = ctx
        .leave
        .decide(
            id,
            org.ceo,
            LeaveAction::Escalate {
                to_role: Role::Ceo,
            },
            None,
        )
        .await
        .unwrap_err();
    TestAssertions::assert_error_code(&err, "NOT_ASSIGNEE");

    let approved = ctx
        .leave
        .decide(id, org.ceo, LeaveAction::Approve, None)
        .await
        .unwrap();
    assert_eq!(approved.status(), LeaveStatus::Approved);

    let strict = TestContext::with_policy(LeavePolicy {
        final_authority_override: false,
        ..LeavePolicy::default()
    })
    .await
    .unwrap();
    let org = Org::seed(strict.pool()).await;
    let id = submit_for(&strict, org.dsi_employee).await;

    let err = strict
        .leave
        .decide(id, org.ceo, LeaveAction::Reject, None)
        .await
        .unwrap_err();
    TestAssertions::assert_error_code(&err, "NOT_ASSIGNEE");
}

#[tokio::test]
async fn stale_snapshot_loses_with_retryable_conflict() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.dsi_employee).await;
    let snapshot = ctx.leave.get(id, org.dsi_employee).await.unwrap();

    ctx.leave
        .apply_decision(snapshot.clone(), org.dsi_dept_head, LeaveAction::Approve, None)
        .await
        .unwrap();
    let err = ctx
        .leave
        .apply_decision(snapshot, org.ceo, LeaveAction::Reject, None)
        .await
        .unwrap_err();

    TestAssertions::assert_error_code(&err, "CONFLICT");
    assert!(err.is_retryable());

    let history = ctx.ledger.history(id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].decision_type, DecisionType::Approve);
    assert_eq!(
        ctx.leave.get(id, org.dsi_employee).await.unwrap().status(),
        LeaveStatus::Approved
    );
}

#[tokio::test]
async fn concurrent_decisions_apply_exactly_once() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.dsi_employee).await;

    let (by_head, by_ceo) = tokio::join!(
        ctx.leave.decide(id, org.dsi_dept_head, LeaveAction::Approve, None),
        ctx.leave.decide(id, org.ceo, LeaveAction::Reject, None),
    );

    let outcomes = [by_head, by_ceo];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    for outcome in &outcomes {
        if let Err(err) = outcome {
            assert!(
                matches!(err.code(), "CONFLICT" | "TERMINAL_STATE"),
                "unexpected error: {}",
                err
            );
        }
    }
    TestAssertions::assert_record_count(ctx.pool(), "leave_decisions", 1).await;
}

#[tokio::test]
async fn racing_approvals_on_a_pending_request_record_one_approval() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.ops_employee).await;
    ctx.leave
        .decide(
            id,
            org.ops_service_head,
            LeaveAction::Escalate {
                to_role: Role::DeptHead,
            },
            None,
        )
        .await
        .unwrap();
    let snapshot = ctx.leave.get(id, org.ops_employee).await.unwrap();
    assert_eq!(snapshot.status(), LeaveStatus::Pending);

    let (by_head, by_ceo) = tokio::join!(
        ctx.leave
            .apply_decision(snapshot.clone(), org.ops_dept_head, LeaveAction::Approve, None),
        ctx.leave
            .apply_decision(snapshot, org.ceo, LeaveAction::Approve, None),
    );

    let outcomes = [by_head, by_ceo];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    let err = outcomes
        .iter()
        .find_map(|outcome| outcome.as_ref().err())
        .unwrap();
    TestAssertions::assert_error_code(err, "CONFLICT");
    assert!(err.is_retryable());

    let history = ctx.ledger.history(id).await.unwrap();
    let kinds: Vec<DecisionType> = history.iter().map(|entry| entry.decision_type).collect();
    assert_eq!(kinds, vec![DecisionType::Escalate, DecisionType::Approve]);
    let approvals: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM leave_decisions WHERE leave_request_id = ? AND decision_type = 'APPROVE'",
    )
    .bind(id)
    .fetch_one(ctx.pool())
    .await
    .unwrap();
    assert_eq!(approvals, 1);
    assert_eq!(
        ctx.leave.get(id, org.ops_employee).await.unwrap().status(),
        LeaveStatus::Approved
    );
}

#[tokio::test]
async fn ledger_rows_cannot_be_rewritten() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.dsi_employee).await;
    ctx.leave
        .decide(id, org.dsi_dept_head, LeaveAction::Approve, None)
        .await
        .unwrap();

    let update = sqlx::query("UPDATE leave_decisions SET decision_type = 'REJECT'")
        .execute(ctx.pool())
        .await;
    let delete = sqlx::query("DELETE FROM leave_decisions")
        .execute(ctx.pool())
        .await;

    assert!(update.is_err());
    assert!(delete.is_err());
    assert_eq!(ctx.ledger.replay_status(id).await.unwrap(), LeaveStatus::Approved);
}

#[tokio::test]
async fn decision_pages_are_filtered_by_involvement() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let first = submit_for(&ctx, org.dsi_employee).await;
    let second = submit_for(&ctx, org.daf_employee).await;

    ctx.leave
        .decide(first, org.dsi_dept_head, LeaveAction::Reject, None)
        .await
        .unwrap();
    ctx.leave
        .decide(second, org.accountant, LeaveAction::Approve, None)
        .await
        .unwrap();

    let page = Page::new(1, 10);
    let by_head = ctx
        .ledger
        .page(DecisionFilter::Actor(org.dsi_dept_head.employee_id), page)
        .await
        .unwrap();
    let on_daf = ctx
        .ledger
        .page(DecisionFilter::Requester(org.daf_employee.employee_id), page)
        .await
        .unwrap();
    let everything = ctx.ledger.page(DecisionFilter::All, page).await.unwrap();

    assert_eq!(by_head.total, 1);
    assert_eq!(by_head.items[0].leave_request_id, first);
    assert_eq!(on_daf.total, 1);
    assert_eq!(on_daf.items[0].leave_request_id, second);
    assert_eq!(everything.total, 2);
    // Newest first
    assert_eq!(everything.items[0].leave_request_id, second);

    assert!(ctx.ledger.has_decided(first, org.dsi_dept_head.employee_id).await.unwrap());
    assert!(!ctx.ledger.has_decided(first, org.accountant.employee_id).await.unwrap());
}

#[tokio::test]
async fn requests_are_visible_only_to_involved_employees() {
    let ctx = TestContext::new().await.unwrap();
    let org = Org::seed(ctx.pool()).await;
    let id = submit_for(&ctx, org.ops_employee).await;
    ctx.leave
        .decide(
            id,
            org.ops_service_head,
            LeaveAction::Escalate {
                to_role: Role::DeptHead,
            },
            None,
        )
        .await
        .unwrap();

    for actor in [org.ops_employee, org.ops_service_head, org.ops_dept_head, org.ceo] {
        ctx.leave.get(id, actor).await.unwrap();
    }

    let err = ctx.leave.get(id, org.daf_employee).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let inbox = ctx
        .leave
        .inbox(org.ops_dept_head, Page::new(1, 10))
        .await
        .unwrap();
    assert_eq!(inbox.total, 1);
    let empty = ctx
        .leave
        .inbox(org.ops_service_head, Page::new(1, 10))
        .await
        .unwrap();
    assert_eq!(empty.total, 0);
}
