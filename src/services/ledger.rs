use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::database::models::{Decision, LeaveStatus, NewDecision};
use crate::database::repositories::{DecisionFilter, decision};
use crate::error::AppError;
use crate::handlers::shared::{Page, Paginated};
use crate::services::state_machine;

/// Append-only record of every decision taken on a leave request.
#[derive(Clone)]
pub struct DecisionLedger {
    pool: SqlitePool,
}

impl DecisionLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends within the caller's transaction so the entry commits or rolls
    /// back together with the state change it records.
    pub async fn append(
        conn: &mut SqliteConnection,
        entry: &NewDecision,
    ) -> Result<Decision, AppError> {
        let recorded = decision::append(conn, entry).await?;

        log::info!(
            "Recorded {} on leave request {} by {}",
            recorded.decision_type,
            recorded.leave_request_id,
            recorded.actor_id
        );

        Ok(recorded)
    }

    /// Full history of one request in the order decisions were taken.
    pub async fn history(&self, request_id: Uuid) -> Result<Vec<Decision>, AppError> {
        let mut conn = self.pool.acquire().await?;
        Ok(decision::list_for_request(&mut conn, request_id).await?)
    }

    pub async fn has_decided(&self, request_id: Uuid, actor_id: Uuid) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        Ok(decision::has_actor_decided(&mut conn, request_id, actor_id).await?)
    }

    pub async fn page(
        &self,
        filter: DecisionFilter,
        page: Page,
    ) -> Result<Paginated<Decision>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let (decisions, total) = decision::list_page(&mut conn, filter, page).await?;

        Ok(Paginated::new(decisions, page, total))
    }

    /// Status implied by the ledger alone, for auditing the stored state.
    pub async fn replay_status(&self, request_id: Uuid) -> Result<LeaveStatus, AppError> {
        let history = self.history(request_id).await?;

        state_machine::replay(&history).map_err(|err| {
            log::error!("Ledger for leave request {} is inconsistent: {}", request_id, err);
            AppError::internal_server_error_message(err.to_string())
        })
    }
}
