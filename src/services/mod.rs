pub mod auth;
pub mod blackout;
pub mod calendar;
pub mod entitlement;
pub mod ledger;
pub mod leave;
pub mod routing;
pub mod state_machine;

pub use auth::{Actor, Claims};
pub use calendar::CalendarService;
pub use ledger::DecisionLedger;
pub use leave::LeaveService;
