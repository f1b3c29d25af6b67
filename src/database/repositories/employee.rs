use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::models::{Employee, EmployeeStatus, Role};
use crate::services::routing::{ApproverCandidates, HolderScope};

const EMPLOYEE_SELECT: &str = r#"
    SELECT
        e.id,
        e.first_name,
        e.last_name,
        e.role,
        e.department_id,
        d.department_type,
        e.service_id,
        e.gender,
        e.hire_date,
        e.base_allowance,
        e.status,
        e.created_at
    FROM
        employees e
        LEFT JOIN departments d ON d.id = e.department_id
"#;

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    employee_id: Uuid,
) -> Result<Option<Employee>, sqlx::Error> {
    let query = format!("{} WHERE e.id = ?", EMPLOYEE_SELECT);

    sqlx::query_as::<_, Employee>(&query)
        .bind(employee_id)
        .fetch_optional(conn)
        .await
}

/// Earliest-hired active holder of the scoped role, ties broken by id.
pub async fn find_role_holder(
    conn: &mut SqliteConnection,
    scope: &HolderScope,
    exclude: Uuid,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT
            id
        FROM
            employees
        WHERE
            role = ?
            AND status = ?
            AND id <> ?
            AND (? IS NULL OR department_id = ?)
            AND (? IS NULL OR service_id = ?)
        ORDER BY
            hire_date ASC,
            id ASC
        LIMIT 1
        "#,
    )
    .bind(scope.role)
    .bind(EmployeeStatus::Active)
    .bind(exclude)
    .bind(scope.department_id)
    .bind(scope.department_id)
    .bind(scope.service_id)
    .bind(scope.service_id)
    .fetch_optional(conn)
    .await
}

/// Current holder of each role in `roles` that is staffed for `requester`.
pub async fn approver_candidates(
    conn: &mut SqliteConnection,
    requester: &Employee,
    roles: &[Role],
) -> Result<ApproverCandidates, sqlx::Error> {
    let mut candidates = ApproverCandidates::new();

    for role in roles {
        let Some(scope) = HolderScope::for_requester(*role, requester) else {
            continue;
        };
        if let Some(holder) = find_role_holder(&mut *conn, &scope, requester.id).await? {
            candidates.insert(*role, holder);
        }
    }

    Ok(candidates)
}
