//! Resource trait for declarative state management
//!
//! A Resource represents something that can be in a certain state,
//! and can be changed to reach a desired state.

use crate::context::ApplyContext;
use crate::types::{ApplyResult, ResourceState};
use anyhow::Result;
use std::fmt;

/// Core trait for declarative resources
///
/// Every resource in the system implements this trait, which provides:
/// - Identity (id, description, type)
/// - Local validation, run before anything touches the network
/// - State detection (current vs desired)
/// - State convergence (apply)
///
/// # Example
///
/// ```ignore
/// use declarative::{Resource, ResourceState, ApplyResult, ApplyContext};
///
/// #[derive(Debug)]
/// struct Label {
///     name: String,
///     remote: Arc<Api>,
/// }
///
/// impl Resource for Label {
///     fn id(&self) -> String {
///         self.name.clone()
///     }
///
///     fn description(&self) -> String {
///         format!("Label {}", self.name)
///     }
///
///     fn resource_type(&self) -> &'static str {
///         "label"
///     }
///
///     fn current_state(&self) -> Result<ResourceState> {
///         Ok(match self.remote.find(&self.name)? {
///             Some(label) => ResourceState::present(label.render()),
///             None => ResourceState::Absent,
///         })
///     }
///
///     fn desired_state(&self) -> ResourceState {
///         ResourceState::present(self.name.clone())
///     }
///
///     fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
///         let id = self.remote.create(&self.name)?;
///         ctx.recorder.record("label", &self.name, &id, None);
///         Ok(ApplyResult::Created)
///     }
/// }
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Unique identifier for this resource
    ///
    /// This should be stable and uniquely identify the resource
    /// within its type, e.g. the manifest label "build" for a pipeline.
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category
    ///
    /// Used for grouping and filtering. Examples:
    /// - "project", "pipeline"
    /// - "context"
    /// - "permission"
    fn resource_type(&self) -> &'static str;

    /// Check the declared configuration without any I/O
    ///
    /// Called for every resource in a plan before any state is read.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Detect the current state of this resource
    fn current_state(&self) -> Result<ResourceState>;

    /// Get the desired state for this resource
    ///
    /// This is typically derived from configuration.
    fn desired_state(&self) -> ResourceState;

    /// Check if the resource needs changes to reach desired state
    ///
    /// Default implementation compares current and desired states.
    fn needs_apply(&self) -> Result<bool> {
        let current = self.current_state()?;
        let desired = self.desired_state();
        Ok(current != desired)
    }

    /// Apply changes to reach the desired state
    ///
    /// This method should:
    /// 1. Re-read the remote object and return NoChange if nothing differs
    /// 2. Respect ctx.dry_run (return Skipped if true)
    /// 3. Make the necessary changes
    /// 4. Record the resulting identity through ctx.recorder
    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;

/// Extension trait for working with resources
pub trait ResourceExt {
    /// Address of the resource: `<type>.<id>`
    fn address(&self) -> String;
}

impl<R: Resource + ?Sized> ResourceExt for R {
    fn address(&self) -> String {
        format!("{}.{}", self.resource_type(), self.id())
    }
}
