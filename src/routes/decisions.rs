use actix_web::web;

use crate::handlers::decisions;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/decisions")
            .route("", web::get().to(decisions::get_all_decisions))
            .route("/mine", web::get().to(decisions::get_my_decisions))
            .route("/requested", web::get().to(decisions::get_requested_decisions)),
    );
}
