pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

use actix_web::web;
use sqlx::SqlitePool;

pub use config::Config;
pub use error::AppError;
pub use services::{CalendarService, DecisionLedger, LeaveService};

/// Shared services handed to every worker.
#[derive(Clone)]
pub struct AppState {
    pub config: web::Data<Config>,
    pub leave_service: web::Data<LeaveService>,
    pub calendar_service: web::Data<CalendarService>,
    pub decision_ledger: web::Data<DecisionLedger>,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        Self {
            leave_service: web::Data::new(LeaveService::new(pool.clone(), config.leave.clone())),
            calendar_service: web::Data::new(CalendarService::new(pool.clone())),
            decision_ledger: web::Data::new(DecisionLedger::new(pool)),
            config: web::Data::new(config),
        }
    }

    /// Registers the services and the `/api/v1` routes on an app.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.leave_service.clone())
            .app_data(self.calendar_service.clone())
            .app_data(self.decision_ledger.clone())
            .configure(routes::configure);
    }
}
