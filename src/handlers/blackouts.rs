use actix_web::{HttpResponse, Result, web};
use uuid::Uuid;

use crate::database::models::BlackoutPeriodInput;
use crate::handlers::shared::ApiResponse;
use crate::services::auth::Claims;
use crate::services::calendar::CalendarService;

pub async fn create_blackout(
    claims: Claims,
    service: web::Data<CalendarService>,
    input: web::Json<BlackoutPeriodInput>,
) -> Result<HttpResponse> {
    let period = service
        .create_blackout(claims.actor(), input.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(period)))
}

pub async fn get_blackouts(
    claims: Claims,
    service: web::Data<CalendarService>,
) -> Result<HttpResponse> {
    let periods = service.list_blackouts(claims.actor()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(periods)))
}

pub async fn get_blackout(
    claims: Claims,
    service: web::Data<CalendarService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let period = service
        .find_blackout(claims.actor(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(period)))
}

pub async fn delete_blackout(
    claims: Claims,
    service: web::Data<CalendarService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service
        .delete_blackout(claims.actor(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        None,
        "Blackout period deleted",
    )))
}
