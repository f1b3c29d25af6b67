//! Query functions grouped by table. Each takes the connection it runs on so
//! the same function serves both pooled reads and transactional writes.

pub mod blackout;
pub mod decision;
pub mod employee;
pub mod leave_request;

pub use decision::DecisionFilter;
