use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{Decision, NewDecision};
use crate::handlers::shared::Page;

// Ledger order is insertion order (seq), never the wall clock.
const DECISION_COLUMNS: &str = r#"
    d.id,
    d.leave_request_id,
    d.decision_type,
    d.actor_id,
    d.target_employee_id,
    d.target_role,
    d.comment,
    d.created_at
"#;

pub async fn append(
    conn: &mut SqliteConnection,
    decision: &NewDecision,
) -> Result<Decision, sqlx::Error> {
    sqlx::query_as::<_, Decision>(
        r#"
        INSERT INTO
            leave_decisions (
                id,
                leave_request_id,
                decision_type,
                actor_id,
                target_employee_id,
                target_role,
                comment,
                created_at
            )
        VALUES
            (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING
            id,
            leave_request_id,
            decision_type,
            actor_id,
            target_employee_id,
            target_role,
            comment,
            created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(decision.leave_request_id)
    .bind(decision.decision_type)
    .bind(decision.actor_id)
    .bind(decision.target_employee_id)
    .bind(decision.target_role)
    .bind(&decision.comment)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

pub async fn list_for_request(
    conn: &mut SqliteConnection,
    request_id: Uuid,
) -> Result<Vec<Decision>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT {}
        FROM leave_decisions d
        WHERE d.leave_request_id = ?
        ORDER BY d.seq ASC
        "#,
        DECISION_COLUMNS
    );

    sqlx::query_as::<_, Decision>(&query)
        .bind(request_id)
        .fetch_all(conn)
        .await
}

pub async fn has_actor_decided(
    conn: &mut SqliteConnection,
    request_id: Uuid,
    actor_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM leave_decisions WHERE leave_request_id = ? AND actor_id = ?
        )
        "#,
    )
    .bind(request_id)
    .bind(actor_id)
    .fetch_one(conn)
    .await
}

/// Which slice of the ledger to page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionFilter {
    /// Decisions made by this employee.
    Actor(Uuid),
    /// Decisions on requests filed by this employee.
    Requester(Uuid),
    All,
}

pub async fn list_page(
    conn: &mut SqliteConnection,
    filter: DecisionFilter,
    page: Page,
) -> Result<(Vec<Decision>, i64), sqlx::Error> {
    let (condition, subject) = match filter {
        DecisionFilter::Actor(actor_id) => ("d.actor_id = ?", Some(actor_id)),
        DecisionFilter::Requester(employee_id) => ("r.employee_id = ?", Some(employee_id)),
        DecisionFilter::All => ("1 = 1", None),
    };
    let from = format!(
        r#"
        FROM
            leave_decisions d
            INNER JOIN leave_requests r ON r.id = d.leave_request_id
        WHERE
            {}
        "#,
        condition
    );

    let total: i64 = {
        let query = format!("SELECT COUNT(*) {}", from);
        let mut prepared = sqlx::query_scalar::<_, i64>(&query);
        if let Some(subject) = subject {
            prepared = prepared.bind(subject);
        }
        prepared.fetch_one(&mut *conn).await?
    };

    let query = format!(
        r#"
        SELECT {}
        {}
        ORDER BY d.seq DESC
        LIMIT ? OFFSET ?
        "#,
        DECISION_COLUMNS, from
    );
    let mut prepared = sqlx::query_as::<_, Decision>(&query);
    if let Some(subject) = subject {
        prepared = prepared.bind(subject);
    }
    let decisions = prepared
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

    Ok((decisions, total))
}
