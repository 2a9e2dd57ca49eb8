//! Apply context and provider traits
//!
//! These traits allow the declarative crate to be used without
//! depending on specific implementations of state storage, progress, etc.

use crate::diff::ResourceDiff;
use crate::types::ApplyResult;
use anyhow::Result;

/// Sink for identities produced by apply operations
///
/// Remote objects are addressed by an identity the service issues (or by
/// name). Implement this trait to persist those identities between runs.
pub trait StateRecorder {
    /// Remember `identity` (and an optional canonical snapshot of the applied
    /// configuration) for the resource `resource_type`/`id`
    fn record(&mut self, resource_type: &str, id: &str, identity: &str, snapshot: Option<String>);

    /// Drop whatever is stored for the resource
    fn forget(&mut self, resource_type: &str, id: &str);
}

/// Recorder that discards everything
pub struct NoRecorder;

impl StateRecorder for NoRecorder {
    fn record(&mut self, _resource_type: &str, _id: &str, _identity: &str, _snapshot: Option<String>) {
    }

    fn forget(&mut self, _resource_type: &str, _id: &str) {}
}

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called once with every pending change, before confirmation
    fn on_plan(&mut self, diffs: &[ResourceDiff]);

    /// Called when starting to apply a batch of resources
    fn on_batch_start(&mut self, count: usize);

    /// Called when starting to apply a single resource
    fn on_resource_start(&mut self, id: &str, description: &str);

    /// Called when a resource application completes
    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult);

    /// Called when a batch completes
    fn on_batch_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_plan(&mut self, _diffs: &[ResourceDiff]) {}
    fn on_batch_start(&mut self, _count: usize) {}
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _id: &str, _result: &ApplyResult) {}
    fn on_batch_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Context passed to resource apply operations
pub struct ApplyContext<'a> {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
    /// Where new or changed identities are recorded
    pub recorder: &'a mut dyn StateRecorder,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context
    pub fn new(dry_run: bool, verbose: bool, recorder: &'a mut dyn StateRecorder) -> Self {
        Self {
            dry_run,
            verbose,
            recorder,
        }
    }
}
