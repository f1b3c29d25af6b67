use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{
    CalendarLeave, LeaveRequest, LeaveStateChange, LeaveStatus, NewLeaveRequest, RequestState,
};
use crate::handlers::shared::Page;

const REQUEST_COLUMNS: &str = r#"
    id,
    employee_id,
    leave_type,
    start_date,
    end_date,
    reason,
    state,
    escalation_count,
    current_assignee_id,
    current_assignee_role,
    version,
    created_at,
    updated_at
"#;

pub async fn insert(
    conn: &mut SqliteConnection,
    request: &NewLeaveRequest,
) -> Result<LeaveRequest, sqlx::Error> {
    let now = Utc::now();
    let query = format!(
        r#"
        INSERT INTO
            leave_requests (
                id,
                employee_id,
                leave_type,
                start_date,
                end_date,
                reason,
                state,
                escalation_count,
                current_assignee_id,
                current_assignee_role,
                version,
                created_at,
                updated_at
            )
        VALUES
            (?, ?, ?, ?, ?, ?, ?, 0, ?, ?, 0, ?, ?)
        RETURNING
            {}
        "#,
        REQUEST_COLUMNS
    );

    sqlx::query_as::<_, LeaveRequest>(&query)
        .bind(Uuid::new_v4())
        .bind(request.employee_id)
        .bind(request.leave_type)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(RequestState::Open)
        .bind(request.assignee_id)
        .bind(request.assignee_role)
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    request_id: Uuid,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM leave_requests WHERE id = ?",
        REQUEST_COLUMNS
    );

    sqlx::query_as::<_, LeaveRequest>(&query)
        .bind(request_id)
        .fetch_optional(conn)
        .await
}

/// Every request an employee has filed, for balance computation.
pub async fn find_all_for_employee(
    conn: &mut SqliteConnection,
    employee_id: Uuid,
) -> Result<Vec<LeaveRequest>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT {}
        FROM leave_requests
        WHERE employee_id = ?
        ORDER BY start_date ASC, id ASC
        "#,
        REQUEST_COLUMNS
    );

    sqlx::query_as::<_, LeaveRequest>(&query)
        .bind(employee_id)
        .fetch_all(conn)
        .await
}

/// Requests an employee has filed, newest first, optionally filtered by status.
pub async fn list_for_employee(
    conn: &mut SqliteConnection,
    employee_id: Uuid,
    status: Option<LeaveStatus>,
    page: Page,
) -> Result<(Vec<LeaveRequest>, i64), sqlx::Error> {
    let (state, escalated) = match status.map(|status| status.state_filter()) {
        Some((state, escalated)) => (Some(state), escalated),
        None => (None, None),
    };
    let filter = r#"
        WHERE
            employee_id = ?
            AND (? IS NULL OR state = ?)
            AND (? IS NULL OR (escalation_count > 0) = ?)
    "#;

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM leave_requests {}",
        filter
    ))
    .bind(employee_id)
    .bind(state)
    .bind(state)
    .bind(escalated)
    .bind(escalated)
    .fetch_one(&mut *conn)
    .await?;

    let query = format!(
        r#"
        SELECT {}
        FROM leave_requests
        {}
        ORDER BY created_at DESC, id ASC
        LIMIT ? OFFSET ?
        "#,
        REQUEST_COLUMNS, filter
    );
    let requests = sqlx::query_as::<_, LeaveRequest>(&query)
        .bind(employee_id)
        .bind(state)
        .bind(state)
        .bind(escalated)
        .bind(escalated)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

    Ok((requests, total))
}

/// Open requests currently assigned to `assignee_id`, oldest first.
pub async fn list_inbox(
    conn: &mut SqliteConnection,
    assignee_id: Uuid,
    page: Page,
) -> Result<(Vec<LeaveRequest>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM leave_requests WHERE current_assignee_id = ? AND state = ?",
    )
    .bind(assignee_id)
    .bind(RequestState::Open)
    .fetch_one(&mut *conn)
    .await?;

    let query = format!(
        r#"
        SELECT {}
        FROM leave_requests
        WHERE
            current_assignee_id = ?
            AND state = ?
        ORDER BY created_at ASC, id ASC
        LIMIT ? OFFSET ?
        "#,
        REQUEST_COLUMNS
    );
    let requests = sqlx::query_as::<_, LeaveRequest>(&query)
        .bind(assignee_id)
        .bind(RequestState::Open)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

    Ok((requests, total))
}

/// Applies `change` only if the stored version still equals `expected_version`.
/// Returns `false` when another decision got there first.
pub async fn compare_and_set(
    conn: &mut SqliteConnection,
    request_id: Uuid,
    expected_version: i64,
    change: &LeaveStateChange,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE
            leave_requests
        SET
            state = ?,
            escalation_count = ?,
            current_assignee_id = ?,
            current_assignee_role = ?,
            version = version + 1,
            updated_at = ?
        WHERE
            id = ?
            AND version = ?
        "#,
    )
    .bind(change.state)
    .bind(change.escalation_count)
    .bind(change.current_assignee_id)
    .bind(change.current_assignee_role)
    .bind(Utc::now())
    .bind(request_id)
    .bind(expected_version)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Approved leave overlapping `[from, to]`, optionally limited to one department.
pub async fn approved_in_range(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
    department_id: Option<Uuid>,
) -> Result<Vec<CalendarLeave>, sqlx::Error> {
    sqlx::query_as::<_, CalendarLeave>(
        r#"
        SELECT
            r.id AS request_id,
            r.employee_id,
            e.first_name,
            e.last_name,
            e.department_id,
            r.leave_type,
            r.start_date,
            r.end_date
        FROM
            leave_requests r
            INNER JOIN employees e ON e.id = r.employee_id
        WHERE
            r.state = ?
            AND r.start_date <= ?
            AND r.end_date >= ?
            AND (? IS NULL OR e.department_id = ?)
        ORDER BY
            r.start_date ASC,
            r.id ASC
        "#,
    )
    .bind(RequestState::Approved)
    .bind(to)
    .bind(from)
    .bind(department_id)
    .bind(department_id)
    .fetch_all(conn)
    .await
}
