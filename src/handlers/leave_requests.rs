use actix_web::{HttpResponse, Result, web};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::database::models::{LeaveRequestInput, LeaveRequestView, LeaveStatus, Role};
use crate::error::AppError;
use crate::handlers::shared::{ApiResponse, PageQuery};
use crate::services::auth::Claims;
use crate::services::ledger::DecisionLedger;
use crate::services::leave::LeaveService;
use crate::services::state_machine::LeaveAction;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyRequestsQuery {
    pub status: Option<LeaveStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalateBody {
    pub to_role: Role,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntitlementQuery {
    pub year: Option<i32>,
}

/// Submit a leave request for the caller
pub async fn submit_leave_request(
    claims: Claims,
    service: web::Data<LeaveService>,
    input: web::Json<LeaveRequestInput>,
) -> Result<HttpResponse> {
    let request = service.submit(claims.actor(), input.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(LeaveRequestView::from(request))))
}

/// The caller's own requests, newest first
pub async fn get_my_requests(
    claims: Claims,
    service: web::Data<LeaveService>,
    config: web::Data<Config>,
    query: web::Query<MyRequestsQuery>,
) -> Result<HttpResponse> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .resolve(config.max_page_size);

    let requests = service
        .list_mine(claims.actor(), query.status, page)
        .await?
        .map(LeaveRequestView::from);

    Ok(HttpResponse::Ok().json(ApiResponse::success(requests)))
}

/// Open requests waiting on the caller
pub async fn get_inbox(
    claims: Claims,
    service: web::Data<LeaveService>,
    config: web::Data<Config>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = query.resolve(config.max_page_size);
    let requests = service
        .inbox(claims.actor(), page)
        .await?
        .map(LeaveRequestView::from);

    Ok(HttpResponse::Ok().json(ApiResponse::success(requests)))
}

pub async fn get_leave_request(
    claims: Claims,
    service: web::Data<LeaveService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let request = service.get(path.into_inner(), claims.actor()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(LeaveRequestView::from(request))))
}

/// Full decision history of one request, oldest first
pub async fn get_leave_request_decisions(
    claims: Claims,
    service: web::Data<LeaveService>,
    ledger: web::Data<DecisionLedger>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let request = service.get(path.into_inner(), claims.actor()).await?;
    let history = ledger.history(request.id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(history)))
}

/// An empty body carries no comment; anything else must be a valid `DecisionBody`.
fn decision_comment(body: &web::Bytes) -> std::result::Result<Option<String>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice::<DecisionBody>(body)
        .map(|body| body.comment)
        .map_err(|err| AppError::BadRequest(format!("Invalid request body: {}", err)))
}

async fn decide(
    claims: Claims,
    service: web::Data<LeaveService>,
    request_id: Uuid,
    action: LeaveAction,
    comment: Option<String>,
) -> Result<HttpResponse> {
    let request = service
        .decide(request_id, claims.actor(), action, comment)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(LeaveRequestView::from(request))))
}

pub async fn approve_leave_request(
    claims: Claims,
    service: web::Data<LeaveService>,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let comment = decision_comment(&body)?;
    decide(claims, service, path.into_inner(), LeaveAction::Approve, comment).await
}

pub async fn reject_leave_request(
    claims: Claims,
    service: web::Data<LeaveService>,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let comment = decision_comment(&body)?;
    decide(claims, service, path.into_inner(), LeaveAction::Reject, comment).await
}

/// Requester-only withdrawal
pub async fn cancel_leave_request(
    claims: Claims,
    service: web::Data<LeaveService>,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let comment = decision_comment(&body)?;
    decide(claims, service, path.into_inner(), LeaveAction::Cancel, comment).await
}

pub async fn escalate_leave_request(
    claims: Claims,
    service: web::Data<LeaveService>,
    path: web::Path<Uuid>,
    body: web::Json<EscalateBody>,
) -> Result<HttpResponse> {
    let EscalateBody { to_role, comment } = body.into_inner();
    decide(
        claims,
        service,
        path.into_inner(),
        LeaveAction::Escalate { to_role },
        comment,
    )
    .await
}

/// Entitlement summary for the caller, defaulting to the current year
pub async fn get_entitlement(
    claims: Claims,
    service: web::Data<LeaveService>,
    query: web::Query<EntitlementQuery>,
) -> Result<HttpResponse> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let summary = service.entitlement(claims.employee_id(), year).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}

pub async fn get_leave_types(
    claims: Claims,
    service: web::Data<LeaveService>,
) -> Result<HttpResponse> {
    let leave_types = service.offerable_leave_types(claims.employee_id()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(leave_types)))
}
