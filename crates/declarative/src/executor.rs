//! Execution engine - applies resources one at a time, in plan order

use crate::context::{ApplyContext, ConfirmCallback, ProgressCallback, StateRecorder};
use crate::diff::{ResourceDiff, compute_diffs};
use crate::planner::ExecutionPlan;
use crate::resource::{Resource, ResourceExt};
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::Result;
use std::collections::HashSet;

/// Execute a plan with the given options and callbacks
///
/// # Type Parameters
/// * `P` - Progress callback type
/// * `C` - Confirm callback type
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run, verbose)
/// * `recorder` - Receives identities of created and replaced resources
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback
///
/// Every resource is validated before any state is read. Only resources
/// with a pending diff are applied. The first failure stops the run and
/// the resources after it are counted as skipped.
///
/// # Returns
/// Summary of execution results
pub fn execute<P, C>(
    plan: ExecutionPlan,
    opts: ExecuteOptions,
    recorder: &mut dyn StateRecorder,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    plan.validate_all()?;

    let diffs = compute_diffs(&plan.resources)?;
    progress.on_plan(&diffs);

    if diffs.is_empty() {
        return Ok(ExecuteSummary {
            no_change: plan.total_resources(),
            ..Default::default()
        });
    }

    if opts.dry_run {
        return Ok(ExecuteSummary::default());
    }

    if !confirm.confirm("Apply changes?")? {
        return Ok(ExecuteSummary {
            skipped: diffs.len(),
            ..Default::default()
        });
    }

    let pending = pending_resources(&plan.resources, &diffs);
    let mut summary = ExecuteSummary {
        no_change: plan.total_resources() - pending.len(),
        ..Default::default()
    };

    progress.on_batch_start(pending.len());
    let mut halted = false;
    for resource in pending {
        if halted {
            let result = ApplyResult::Skipped {
                reason: "earlier failure".into(),
            };
            progress.on_resource_complete(&resource.id(), &result);
            summary.add_result(&result);
            continue;
        }

        progress.on_resource_start(&resource.id(), &resource.description());
        let result = apply_resource(resource, opts.verbose, recorder);
        progress.on_resource_complete(&resource.id(), &result);

        if !result.is_success() {
            log::error!("{} failed, stopping", resource.address());
            halted = true;
        }
        summary.add_result(&result);
    }
    progress.on_batch_complete();

    Ok(summary)
}

/// Resources that have a diff, in plan order
fn pending_resources<'a>(
    resources: &'a [Box<dyn Resource>],
    diffs: &[ResourceDiff],
) -> Vec<&'a dyn Resource> {
    let changed: HashSet<String> = diffs.iter().map(ResourceDiff::address).collect();
    resources
        .iter()
        .map(AsRef::as_ref)
        .filter(|r| changed.contains(&r.address()))
        .collect()
}

/// Apply a single resource
fn apply_resource(
    resource: &dyn Resource,
    verbose: bool,
    recorder: &mut dyn StateRecorder,
) -> ApplyResult {
    let mut ctx = ApplyContext::new(false, verbose, recorder);

    match resource.apply(&mut ctx) {
        Ok(result) => result,
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
    }
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(
    plan: ExecutionPlan,
    opts: ExecuteOptions,
    recorder: &mut dyn StateRecorder,
) -> Result<ExecuteSummary> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(plan, opts, recorder, &mut NoProgress, &mut AutoConfirm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress, NoRecorder};
    use crate::types::ResourceState;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestResource {
        id: String,
        should_change: bool,
        fail: bool,
        valid: bool,
        reads: Arc<AtomicUsize>,
        applies: Arc<AtomicUsize>,
    }

    impl TestResource {
        fn new(id: &str, should_change: bool) -> Self {
            Self {
                id: id.into(),
                should_change,
                fail: false,
                valid: true,
                reads: Arc::default(),
                applies: Arc::default(),
            }
        }
    }

    impl Resource for TestResource {
        fn id(&self) -> String {
            self.id.clone()
        }

        fn description(&self) -> String {
            format!("Test resource {}", self.id)
        }

        fn resource_type(&self) -> &'static str {
            "test"
        }

        fn validate(&self) -> Result<()> {
            if self.valid {
                Ok(())
            } else {
                bail!("invalid")
            }
        }

        fn current_state(&self) -> Result<ResourceState> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.should_change {
                Ok(ResourceState::Absent)
            } else {
                Ok(ResourceState::Present { details: None })
            }
        }

        fn desired_state(&self) -> ResourceState {
            ResourceState::Present { details: None }
        }

        fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
            self.applies.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("remote rejected {}", self.id);
            }
            ctx.recorder.record("test", &self.id, "generated-id", None);
            Ok(ApplyResult::Created)
        }
    }

    #[derive(Default)]
    struct Recorded(Vec<(String, String)>);

    impl StateRecorder for Recorded {
        fn record(&mut self, _t: &str, id: &str, identity: &str, _s: Option<String>) {
            self.0.push((id.to_string(), identity.to_string()));
        }

        fn forget(&mut self, _t: &str, _id: &str) {}
    }

    fn plan_of(resources: Vec<TestResource>) -> ExecutionPlan {
        let mut plan = ExecutionPlan::new();
        for r in resources {
            plan.add_resource(Box::new(r));
        }
        plan
    }

    #[test]
    fn test_execute_empty_plan() {
        let result = execute_simple(
            ExecutionPlan::new(),
            ExecuteOptions::default(),
            &mut NoRecorder,
        )
        .unwrap();

        assert_eq!(result.total(), 0);
    }

    #[test]
    fn test_execute_no_changes() {
        let resource = TestResource::new("test1", false);
        let applies = resource.applies.clone();

        let result = execute_simple(
            plan_of(vec![resource]),
            ExecuteOptions::default(),
            &mut NoRecorder,
        )
        .unwrap();

        assert_eq!(result.no_change, 1);
        assert_eq!(applies.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_execute_with_changes_records_identity() {
        let mut recorder = Recorded::default();
        let result = execute_simple(
            plan_of(vec![
                TestResource::new("a", true),
                TestResource::new("b", false),
            ]),
            ExecuteOptions::default(),
            &mut recorder,
        )
        .unwrap();

        assert_eq!(result.created, 1);
        assert_eq!(result.no_change, 1);
        assert_eq!(
            recorder.0,
            vec![("a".to_string(), "generated-id".to_string())]
        );
    }

    #[test]
    fn test_dry_run_reads_but_never_applies() {
        let resource = TestResource::new("a", true);
        let applies = resource.applies.clone();
        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };

        let result = execute_simple(plan_of(vec![resource]), opts, &mut NoRecorder).unwrap();

        assert_eq!(result.total(), 0);
        assert_eq!(applies.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_declined_counts_as_skipped() {
        let result = execute(
            plan_of(vec![TestResource::new("a", true)]),
            ExecuteOptions::default(),
            &mut NoRecorder,
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(result.skipped, 1);
        assert_eq!(result.total_changes(), 0);
    }

    #[test]
    fn test_invalid_resource_stops_before_reads() {
        let first = TestResource::new("a", true);
        let reads = first.reads.clone();
        let mut bad = TestResource::new("b", true);
        bad.valid = false;

        let err = execute(
            plan_of(vec![first, bad]),
            ExecuteOptions::default(),
            &mut NoRecorder,
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap_err();

        assert!(err.to_string().contains("test.b"));
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_first_failure_skips_the_rest() {
        let mut failing = TestResource::new("a", true);
        failing.fail = true;
        let later = TestResource::new("b", true);
        let later_applies = later.applies.clone();

        let result = execute_simple(
            plan_of(vec![failing, later]),
            ExecuteOptions::default(),
            &mut NoRecorder,
        )
        .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.skipped, 1);
        assert!(!result.is_success());
        assert_eq!(later_applies.load(Ordering::SeqCst), 0);
    }
}
