use actix_web::{HttpResponse, Result, web};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::handlers::shared::ApiResponse;
use crate::services::auth::Claims;
use crate::services::calendar::CalendarService;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Approved leave and blackout periods in `[from, to]`
pub async fn get_calendar(
    claims: Claims,
    service: web::Data<CalendarService>,
    query: web::Query<CalendarQuery>,
) -> Result<HttpResponse> {
    let view = service
        .calendar(claims.actor(), query.from, query.to)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}
