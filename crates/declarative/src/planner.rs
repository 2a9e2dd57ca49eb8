//! Execution planner - builds resource execution plans

use crate::resource::{BoxedResource, Resource, ResourceExt};
use anyhow::{Result, bail};

/// An ordered list of resources to reconcile
///
/// Resources are applied in insertion order, so callers add dependencies
/// (e.g. a project) before the resources that reference them.
pub struct ExecutionPlan {
    /// Resources in apply order
    pub resources: Vec<BoxedResource>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    /// Append a resource to the plan
    pub fn add_resource(&mut self, resource: BoxedResource) {
        self.resources.push(resource);
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            resources: self
                .resources
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), name.as_deref()))
            }
        }
    }

    /// Validate every resource, reporting all problems at once
    pub fn validate_all(&self) -> Result<()> {
        let problems: Vec<String> = self
            .resources
            .iter()
            .filter_map(|r| r.validate().err().map(|e| format!("{}: {e:#}", r.address())))
            .collect();

        if problems.is_empty() {
            return Ok(());
        }
        bail!("invalid configuration:\n  {}", problems.join("\n  "))
    }

    /// Total number of resources in the plan
    pub fn total_resources(&self) -> usize {
        self.resources.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a target string like "type.name" into (type, name)
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some((t, name)) if !t.is_empty() => (Some(t.to_string()), Some(name.to_string())),
        Some(_) => (None, Some(target.to_string())),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(
    resource: &dyn Resource,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    if let Some(rt) = resource_type {
        // Plural aliases, as used for manifest sections
        let rt = rt.strip_suffix('s').unwrap_or(rt);
        if resource.resource_type() != rt {
            return false;
        }
    }

    if let Some(n) = name
        && resource.id() != n
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApplyContext;
    use crate::types::{ApplyResult, ResourceState};

    #[derive(Debug)]
    struct Named {
        kind: &'static str,
        id: &'static str,
        valid: bool,
    }

    impl Resource for Named {
        fn id(&self) -> String {
            self.id.to_string()
        }

        fn description(&self) -> String {
            self.id.to_string()
        }

        fn resource_type(&self) -> &'static str {
            self.kind
        }

        fn validate(&self) -> Result<()> {
            if self.valid {
                Ok(())
            } else {
                bail!("bad {}", self.id)
            }
        }

        fn current_state(&self) -> Result<ResourceState> {
            Ok(ResourceState::Absent)
        }

        fn desired_state(&self) -> ResourceState {
            ResourceState::Absent
        }

        fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::NoChange)
        }
    }

    fn plan() -> ExecutionPlan {
        let mut plan = ExecutionPlan::new();
        for (kind, id) in [("project", "web"), ("pipeline", "build"), ("pipeline", "deploy")] {
            plan.add_resource(Box::new(Named {
                kind,
                id,
                valid: true,
            }));
        }
        plan
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("pipeline"), (Some("pipeline".to_string()), None));
        assert_eq!(
            parse_target("pipeline.build"),
            (Some("pipeline".to_string()), Some("build".to_string()))
        );
        assert_eq!(
            parse_target("context.a.b"),
            (Some("context".to_string()), Some("a.b".to_string()))
        );
    }

    #[test]
    fn test_filter_by_type_and_alias() {
        assert_eq!(plan().filter_by_target(Some("pipeline")).total_resources(), 2);
        assert_eq!(plan().filter_by_target(Some("pipelines")).total_resources(), 2);
        assert_eq!(plan().filter_by_target(None).total_resources(), 3);
    }

    #[test]
    fn test_filter_by_address() {
        let filtered = plan().filter_by_target(Some("pipeline.deploy"));
        assert_eq!(filtered.total_resources(), 1);
        assert_eq!(filtered.resources[0].id(), "deploy");
    }

    #[test]
    fn test_validate_all_collects_problems() {
        let mut plan = plan();
        assert!(plan.validate_all().is_ok());

        plan.add_resource(Box::new(Named {
            kind: "permission",
            id: "p1",
            valid: false,
        }));
        plan.add_resource(Box::new(Named {
            kind: "permission",
            id: "p2",
            valid: false,
        }));
        let message = plan.validate_all().unwrap_err().to_string();
        assert!(message.contains("permission.p1: bad p1"));
        assert!(message.contains("permission.p2: bad p2"));
    }
}
