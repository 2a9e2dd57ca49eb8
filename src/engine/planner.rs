//! Build an execution plan from the manifest and the state file
//!
//! Declared objects are added in dependency order: projects, contexts,
//! pipelines, permissions. Objects recorded in state but no longer declared
//! are appended as removals in the reverse order.

use std::sync::Arc;

use cfclient::Client;
use declarative::{ExecutionPlan, Resource};

use crate::resource::{
    ContextResource, PermissionResource, PipelineResource, ProjectResource, context, permission,
    pipeline, project,
};
use crate::schema::Manifest;
use crate::state::SyncState;

/// Resource types in apply order
pub const RESOURCE_TYPES: [&str; 4] = [
    project::RESOURCE_TYPE,
    context::RESOURCE_TYPE,
    pipeline::RESOURCE_TYPE,
    permission::RESOURCE_TYPE,
];

pub fn build_plan(manifest: &Manifest, state: &SyncState, client: &Arc<Client>) -> ExecutionPlan {
    let mut plan = ExecutionPlan::new();

    for (label, config) in &manifest.projects {
        plan.add_resource(Box::new(ProjectResource::new(
            Arc::clone(client),
            label,
            Some(config.clone()),
            state.identity(project::RESOURCE_TYPE, label),
        )));
    }
    for (label, config) in &manifest.contexts {
        let record = state.get(context::RESOURCE_TYPE, label);
        plan.add_resource(Box::new(
            ContextResource::new(
                Arc::clone(client),
                label,
                Some(config.clone()),
                record.map(|r| r.identity.clone()),
            )
            .with_snapshot(record.and_then(|r| r.snapshot.as_deref())),
        ));
    }
    for (label, config) in &manifest.pipelines {
        plan.add_resource(Box::new(PipelineResource::new(
            Arc::clone(client),
            label,
            Some(config.clone()),
            state.identity(pipeline::RESOURCE_TYPE, label),
        )));
    }
    for (label, config) in &manifest.permissions {
        plan.add_resource(Box::new(PermissionResource::new(
            Arc::clone(client),
            label,
            Some(config.clone()),
            state.identity(permission::RESOURCE_TYPE, label),
        )));
    }

    for resource_type in RESOURCE_TYPES.iter().rev() {
        for label in state.labels(resource_type) {
            if manifest.declares(resource_type, &label) {
                continue;
            }
            let record = state.get(resource_type, &label);
            log::debug!("{resource_type}.{label} is no longer declared");
            plan.add_resource(removal(
                client,
                resource_type,
                &label,
                record.map(|r| r.identity.clone()),
                record.and_then(|r| r.snapshot.clone()),
            ));
        }
    }

    plan
}

fn removal(
    client: &Arc<Client>,
    resource_type: &str,
    label: &str,
    identity: Option<String>,
    snapshot: Option<String>,
) -> Box<dyn Resource> {
    let client = Arc::clone(client);
    match resource_type {
        project::RESOURCE_TYPE => Box::new(ProjectResource::new(client, label, None, identity)),
        context::RESOURCE_TYPE => Box::new(
            ContextResource::new(client, label, None, identity)
                .with_snapshot(snapshot.as_deref()),
        ),
        pipeline::RESOURCE_TYPE => Box::new(PipelineResource::new(client, label, None, identity)),
        _ => Box::new(PermissionResource::new(client, label, None, identity)),
    }
}

/// `(type, label)` of every removal in the plan
///
/// A removal whose remote object is already gone produces no diff and is
/// never applied; callers forget these after a complete apply.
pub fn stale_addresses(plan: &ExecutionPlan) -> Vec<(String, String)> {
    plan.resources
        .iter()
        .filter(|r| r.desired_state().is_absent())
        .map(|r| (r.resource_type().to_string(), r.id()))
        .collect()
}
