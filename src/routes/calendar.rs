use actix_web::web;

use crate::handlers::{blackouts, calendar};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/calendar", web::get().to(calendar::get_calendar))
        .service(
            web::scope("/blackouts")
                .route("", web::post().to(blackouts::create_blackout))
                .route("", web::get().to(blackouts::get_blackouts))
                .route("/{id}", web::get().to(blackouts::get_blackout))
                .route("/{id}", web::delete().to(blackouts::delete_blackout)),
        );
}
