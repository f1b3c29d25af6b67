use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{LeaveStatus, LeaveType, Role};
use crate::handlers::shared::ApiResponse;

/// Input that is malformed or not grantable. Never partially persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("leave type {leave_type} is not offered to this employee")]
    InvalidLeaveType { leave_type: LeaveType },

    #[error("insufficient balance for {year}: {requested} day(s) requested, {remaining} remaining")]
    InsufficientBalance {
        year: i32,
        requested: i64,
        remaining: i64,
    },

    #[error("requested dates overlap {} blackout period(s)", .periods.len())]
    BlackoutConflict { periods: Vec<Uuid> },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidRange { .. } => "INVALID_RANGE",
            ValidationError::InvalidLeaveType { .. } => "INVALID_LEAVE_TYPE",
            ValidationError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            ValidationError::BlackoutConflict { .. } => "BLACKOUT_CONFLICT",
        }
    }
}

/// A decision that the state machine or the routing table refuses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("only the current assignee may act on this request")]
    NotAssignee,

    #[error("only the requester may cancel this request")]
    NotRequester,

    #[error("request is already {0}")]
    TerminalState(LeaveStatus),

    #[error("cannot escalate from {from} to {to} for this requester")]
    IllegalEscalation { from: Role, to: Role },

    #[error("no eligible approver holds the {0} role")]
    NoEligibleApprover(Role),

    #[error("requests from the {0} role have no approval chain")]
    UnroutableRequester(Role),
}

impl TransitionError {
    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::NotAssignee => "NOT_ASSIGNEE",
            TransitionError::NotRequester => "NOT_REQUESTER",
            TransitionError::TerminalState(_) => "TERMINAL_STATE",
            TransitionError::IllegalEscalation { .. } => "ILLEGAL_ESCALATION",
            TransitionError::NoEligibleApprover(_) => "NO_ELIGIBLE_APPROVER",
            TransitionError::UnroutableRequester(_) => "UNROUTABLE_REQUESTER",
        }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            TransitionError::NotAssignee | TransitionError::NotRequester
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transition refused: {0}")]
    Transition(#[from] TransitionError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub code: String,
    pub category: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }

    pub fn internal_server_error() -> Self {
        AppError::InternalServerError(None)
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "INTERNAL",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHENTICATED",
            AppError::Validation(err) => err.code(),
            AppError::Transition(err) => err.code(),
            AppError::Conflict(_) => "CONFLICT",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "internal",
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) | AppError::Unauthorized => "authorization",
            AppError::BadRequest(_) | AppError::Validation(_) => "validation",
            AppError::Transition(err) if err.is_authorization() => "authorization",
            AppError::Transition(_) => "state",
            AppError::Conflict(_) => "conflict",
        }
    }

    /// Callers may retry after re-fetching current state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation(ValidationError::BlackoutConflict { periods }) => {
                Some(serde_json::json!({ "blackoutPeriodIds": periods }))
            }
            AppError::Validation(ValidationError::InsufficientBalance {
                year,
                requested,
                remaining,
            }) => Some(serde_json::json!({
                "year": year,
                "requestedDays": requested,
                "remainingDays": remaining,
            })),
            AppError::Transition(TransitionError::TerminalState(status)) => {
                Some(serde_json::json!({ "status": status }))
            }
            _ => None,
        }
    }

    pub fn error_details(&self) -> ErrorDetails {
        ErrorDetails {
            code: self.code().to_string(),
            category: self.category().to_string(),
            retryable: self.is_retryable(),
            details: self.details(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Transition(err) if err.is_authorization() => StatusCode::FORBIDDEN,
            AppError::Transition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        if status_code.is_server_error() {
            log::error!(
                "Request failed with status {}: {}",
                status_code,
                error_message
            );
        } else {
            log::warn!(
                "Request failed with status {}: {}",
                status_code,
                error_message
            );
        }

        let response_body = ApiResponse::error_with_data(self.error_details(), &error_message);

        HttpResponse::build(status_code).json(response_body)
    }
}

fn is_busy(error: &sqlx::Error) -> bool {
    match error {
        // SQLITE_BUSY, SQLITE_LOCKED and their extended codes
        sqlx::Error::Database(db_error) => matches!(
            db_error.code().as_deref(),
            Some("5") | Some("6") | Some("261") | Some("262") | Some("517")
        ),
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if is_busy(&error) {
            log::warn!("Database busy, reporting conflict: {}", error);
            return AppError::Conflict("storage is busy, retry the request".to_string());
        }

        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        log::error!("Anyhow error: {}", error);

        match error.downcast::<sqlx::Error>() {
            Ok(sqlx_err) => AppError::from(sqlx_err),
            Err(original_error) => AppError::InternalServerError(Some(original_error.to_string())),
        }
    }
}
