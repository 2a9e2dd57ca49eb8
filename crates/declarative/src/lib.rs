//! # Declarative
//!
//! A framework for declarative resource management.
//!
//! This crate provides the core abstractions for declaring desired state,
//! detecting current state, and converging remote objects to match it.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something with state that can be managed (a project, a pipeline)
//! - **ResourceState**: The current or desired state of a resource
//! - **ExecutionPlan**: An ordered list of resources
//! - **Executor**: Validates, diffs, confirms, then applies sequentially
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     Resource, ResourceState, ApplyResult, ApplyContext,
//!     ExecutionPlan, ExecuteOptions, NoRecorder, execute_simple,
//! };
//!
//! #[derive(Debug)]
//! struct Marker { path: String }
//!
//! impl Resource for Marker {
//!     fn id(&self) -> String { self.path.clone() }
//!     fn description(&self) -> String { format!("Marker: {}", self.path) }
//!     fn resource_type(&self) -> &'static str { "marker" }
//!
//!     fn current_state(&self) -> anyhow::Result<ResourceState> {
//!         if std::path::Path::new(&self.path).exists() {
//!             Ok(ResourceState::Present { details: None })
//!         } else {
//!             Ok(ResourceState::Absent)
//!         }
//!     }
//!
//!     fn desired_state(&self) -> ResourceState {
//!         ResourceState::Present { details: None }
//!     }
//!
//!     fn apply(&self, ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
//!         std::fs::write(&self.path, "")?;
//!         ctx.recorder.record("marker", &self.path, &self.path, None);
//!         Ok(ApplyResult::Created)
//!     }
//! }
//!
//! let mut plan = ExecutionPlan::new();
//! plan.add_resource(Box::new(Marker { path: "/tmp/marker".into() }));
//!
//! let summary = execute_simple(plan, ExecuteOptions::default(), &mut NoRecorder)?;
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`StateRecorder`]: Persists identities issued during apply
//! - [`ProgressCallback`]: Receives the plan and progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks or state storage.

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, NoRecorder,
    ProgressCallback, StateRecorder,
};
pub use diff::{DiffSummary, ResourceDiff, compute_diffs, group_by_type};
pub use executor::{execute, execute_simple};
pub use planner::ExecutionPlan;
pub use resource::{BoxedResource, Resource, ResourceExt};
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary, ResourceState};
