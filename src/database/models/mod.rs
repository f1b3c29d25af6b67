pub mod blackout;
pub mod decision;
pub mod employee;
pub mod leave;
pub(crate) mod macros;

// Re-export all models for easy importing
pub use blackout::*;
pub use decision::*;
pub use employee::*;
pub use leave::*;
