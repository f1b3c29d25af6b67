use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::{
    BlackoutPeriod, BlackoutPeriodInput, BlackoutPeriodRow, BlackoutScope, BlackoutScopeKind,
};

const BLACKOUT_COLUMNS: &str = r#"
    id,
    title,
    start_date,
    end_date,
    scope,
    department_id,
    created_by,
    created_at
"#;

fn corrupt(error: String) -> sqlx::Error {
    sqlx::Error::Decode(error.into())
}

async fn attach_members(
    conn: &mut SqliteConnection,
    rows: Vec<BlackoutPeriodRow>,
) -> Result<Vec<BlackoutPeriod>, sqlx::Error> {
    let mut members: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

    for row in rows.iter().filter(|row| row.scope == BlackoutScopeKind::Employees) {
        let employee_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT employee_id
            FROM blackout_period_employees
            WHERE blackout_period_id = ?
            ORDER BY employee_id
            "#,
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;
        members.insert(row.id, employee_ids);
    }

    rows.into_iter()
        .map(|row| {
            let employee_ids = members.remove(&row.id).unwrap_or_default();
            row.into_period(employee_ids).map_err(corrupt)
        })
        .collect()
}

pub async fn insert(
    conn: &mut SqliteConnection,
    input: &BlackoutPeriodInput,
    created_by: Uuid,
) -> Result<BlackoutPeriod, sqlx::Error> {
    let department_id = match &input.scope {
        BlackoutScope::Department { department_id } => Some(*department_id),
        _ => None,
    };
    let query = format!(
        r#"
        INSERT INTO
            blackout_periods (
                id,
                title,
                start_date,
                end_date,
                scope,
                department_id,
                created_by,
                created_at
            )
        VALUES
            (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING
            {}
        "#,
        BLACKOUT_COLUMNS
    );

    let row = sqlx::query_as::<_, BlackoutPeriodRow>(&query)
        .bind(Uuid::new_v4())
        .bind(&input.title)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.scope.kind())
        .bind(department_id)
        .bind(created_by)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

    if let BlackoutScope::Employees { employee_ids } = &input.scope {
        for employee_id in employee_ids {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO
                    blackout_period_employees (blackout_period_id, employee_id)
                VALUES
                    (?, ?)
                "#,
            )
            .bind(row.id)
            .bind(employee_id)
            .execute(&mut *conn)
            .await?;
        }
    }

    let mut periods = attach_members(conn, vec![row]).await?;
    periods
        .pop()
        .ok_or_else(|| corrupt("inserted blackout period vanished".to_string()))
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    blackout_id: Uuid,
) -> Result<Option<BlackoutPeriod>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM blackout_periods WHERE id = ?",
        BLACKOUT_COLUMNS
    );
    let row = sqlx::query_as::<_, BlackoutPeriodRow>(&query)
        .bind(blackout_id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(attach_members(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Periods whose dates intersect `[from, to]`, regardless of scope.
pub async fn overlapping(
    conn: &mut SqliteConnection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<BlackoutPeriod>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT {}
        FROM blackout_periods
        WHERE
            start_date <= ?
            AND end_date >= ?
        ORDER BY start_date ASC, id ASC
        "#,
        BLACKOUT_COLUMNS
    );
    let rows = sqlx::query_as::<_, BlackoutPeriodRow>(&query)
        .bind(to)
        .bind(from)
        .fetch_all(&mut *conn)
        .await?;

    attach_members(conn, rows).await
}

pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<BlackoutPeriod>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM blackout_periods ORDER BY start_date ASC, id ASC",
        BLACKOUT_COLUMNS
    );
    let rows = sqlx::query_as::<_, BlackoutPeriodRow>(&query)
        .fetch_all(&mut *conn)
        .await?;

    attach_members(conn, rows).await
}

pub async fn delete(conn: &mut SqliteConnection, blackout_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blackout_periods WHERE id = ?")
        .bind(blackout_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
