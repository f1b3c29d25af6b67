use actix_web::web;

use crate::handlers::leave_requests;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/leave-types", web::get().to(leave_requests::get_leave_types))
        .service(
            web::scope("/leave-requests")
                .route("", web::post().to(leave_requests::submit_leave_request))
                // fixed segments before "/{id}"
                .route("/mine", web::get().to(leave_requests::get_my_requests))
                .route("/inbox", web::get().to(leave_requests::get_inbox))
                .route(
                    "/entitlement",
                    web::get().to(leave_requests::get_entitlement),
                )
                .route("/{id}", web::get().to(leave_requests::get_leave_request))
                .route(
                    "/{id}/decisions",
                    web::get().to(leave_requests::get_leave_request_decisions),
                )
                .route(
                    "/{id}/approve",
                    web::post().to(leave_requests::approve_leave_request),
                )
                .route(
                    "/{id}/reject",
                    web::post().to(leave_requests::reject_leave_request),
                )
                .route(
                    "/{id}/escalate",
                    web::post().to(leave_requests::escalate_leave_request),
                )
                .route(
                    "/{id}/cancel",
                    web::post().to(leave_requests::cancel_leave_request),
                ),
        );
}
