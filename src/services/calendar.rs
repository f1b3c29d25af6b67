use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::DatabaseTransaction;
use crate::database::models::{BlackoutPeriod, BlackoutPeriodInput, BlackoutScope, CalendarLeave};
use crate::database::repositories::{blackout, employee, leave_request};
use crate::error::{AppError, ValidationError};
use crate::services::auth::Actor;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub leaves: Vec<CalendarLeave>,
    pub blackout_periods: Vec<BlackoutPeriod>,
}

fn require_final_authority(actor: &Actor) -> Result<(), AppError> {
    if actor.role.is_final_authority() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the final authority may manage blackout periods".to_string(),
        ))
    }
}

/// Blackout administration and the shared absence calendar.
#[derive(Clone)]
pub struct CalendarService {
    pool: SqlitePool,
}

impl CalendarService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// New periods only affect later submissions; existing approvals stand.
    pub async fn create_blackout(
        &self,
        actor: Actor,
        input: BlackoutPeriodInput,
    ) -> Result<BlackoutPeriod, AppError> {
        require_final_authority(&actor)?;

        if input.end_date < input.start_date {
            return Err(ValidationError::InvalidRange {
                start: input.start_date,
                end: input.end_date,
            }
            .into());
        }
        if let BlackoutScope::Employees { employee_ids } = &input.scope {
            if employee_ids.is_empty() {
                return Err(AppError::BadRequest(
                    "An employee-scoped blackout needs at least one employee".to_string(),
                ));
            }
        }

        let period = DatabaseTransaction::run(&self.pool, move |conn| {
            Box::pin(async move {
                Ok::<_, AppError>(blackout::insert(&mut *conn, &input, actor.employee_id).await?)
            })
        })
        .await?;

        log::info!(
            "Blackout period {} ({} to {}, {}) created by {}",
            period.id,
            period.start_date,
            period.end_date,
            period.scope.kind(),
            actor.employee_id
        );

        Ok(period)
    }

    pub async fn list_blackouts(&self, actor: Actor) -> Result<Vec<BlackoutPeriod>, AppError> {
        require_final_authority(&actor)?;

        let mut conn = self.pool.acquire().await?;
        Ok(blackout::list_all(&mut conn).await?)
    }

    pub async fn delete_blackout(&self, actor: Actor, blackout_id: Uuid) -> Result<(), AppError> {
        require_final_authority(&actor)?;

        let deleted = DatabaseTransaction::run(&self.pool, move |conn| {
            Box::pin(async move { Ok::<_, AppError>(blackout::delete(&mut *conn, blackout_id).await?) })
        })
        .await?;

        if !deleted {
            return Err(AppError::NotFound(format!(
                "Blackout period {} not found",
                blackout_id
            )));
        }

        log::info!(
            "Blackout period {} deleted by {}",
            blackout_id,
            actor.employee_id
        );
        Ok(())
    }

    pub async fn find_blackout(&self, actor: Actor, blackout_id: Uuid) -> Result<BlackoutPeriod, AppError> {
        require_final_authority(&actor)?;

        let mut conn = self.pool.acquire().await?;
        blackout::find_by_id(&mut conn, blackout_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blackout period {} not found", blackout_id)))
    }

    /// Approved leave and blackout periods intersecting `[from, to]`.
    ///
    /// The final authority sees the whole organisation; everyone else sees
    /// their department's approved leave and the blackouts that bind them.
    pub async fn calendar(
        &self,
        actor: Actor,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<CalendarView, AppError> {
        if to < from {
            return Err(ValidationError::InvalidRange {
                start: from,
                end: to,
            }
            .into());
        }

        let mut conn = self.pool.acquire().await?;
        let periods = blackout::overlapping(&mut conn, from, to).await?;

        let (leaves, blackout_periods) = if actor.role.is_org_wide() {
            let leaves = leave_request::approved_in_range(&mut conn, from, to, None).await?;
            (leaves, periods)
        } else {
            let viewer = employee::find_by_id(&mut conn, actor.employee_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Employee {} not found", actor.employee_id))
                })?;

            let leaves: Vec<CalendarLeave> = match viewer.department_id {
                Some(department_id) => {
                    leave_request::approved_in_range(&mut conn, from, to, Some(department_id))
                        .await?
                }
                None => leave_request::approved_in_range(&mut conn, from, to, None)
                    .await?
                    .into_iter()
                    .filter(|leave| leave.employee_id == viewer.id)
                    .collect(),
            };
            let binding: Vec<BlackoutPeriod> = periods
                .into_iter()
                .filter(|period| period.scope.applies_to(viewer.id, viewer.department_id))
                .collect();
            (leaves, binding)
        };

        Ok(CalendarView {
            from,
            to,
            leaves,
            blackout_periods,
        })
    }
}
