// Plan, apply and validate
pub mod declarative;

// Single-object commands
pub mod import;
pub mod show;
