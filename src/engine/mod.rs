//! Execution engine for cfsync
//!
//! The engine orchestrates:
//! 1. Planning - Build resources from the manifest and the state file
//! 2. Diffing - Render current vs desired state for display
//! 3. Executing - Confirm, apply in order and summarize

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{ApplyOptions, apply};
pub use planner::{build_plan, stale_addresses};
