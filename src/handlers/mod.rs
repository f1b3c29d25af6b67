pub mod blackouts;
pub mod calendar;
pub mod decisions;
pub mod leave_requests;
pub mod shared;
