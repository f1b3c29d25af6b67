use actix_web::{HttpRequest, HttpResponse, error, web};

use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::middleware::RequestIdExt;

pub mod calendar;
pub mod decisions;
pub mod leave_requests;

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
    AppError::BadRequest(format!("Invalid request body: {}", err)).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> error::Error {
    AppError::BadRequest(format!("Invalid query string: {}", err)).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> error::Error {
    AppError::BadRequest(format!("Invalid path parameter: {}", err)).into()
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    log::warn!(
        "No route for {} {} (correlation_id={})",
        req.method(),
        req.path(),
        req.correlation_id().unwrap_or_default()
    );
    HttpResponse::NotFound().json(ApiResponse::error("Route not found"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .service(
            web::scope("/api/v1")
                .configure(leave_requests::configure)
                .configure(decisions::configure)
                .configure(calendar::configure),
        )
        .default_service(web::to(not_found));
}
