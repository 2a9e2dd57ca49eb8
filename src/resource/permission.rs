//! Permission resource

use anyhow::{Context as _, Result};
use cfclient::{Client, Permission};
use std::sync::Arc;

use super::{ApplyContext, ApplyResult, Resource, found, rendered};
use crate::mapping::permission::{self, PermissionChange};
use crate::mapping::render;
use crate::schema::PermissionConfig;
use declarative::ResourceState;

pub const RESOURCE_TYPE: &str = "permission";

#[derive(Debug)]
pub struct PermissionResource {
    client: Arc<Client>,
    label: String,
    desired: Option<PermissionConfig>,
    identity: Option<String>,
}

impl PermissionResource {
    pub fn new(
        client: Arc<Client>,
        label: &str,
        desired: Option<PermissionConfig>,
        identity: Option<String>,
    ) -> Self {
        Self {
            client,
            label: label.to_string(),
            desired,
            identity,
        }
    }

    fn read(&self) -> Result<Option<Permission>> {
        match &self.identity {
            Some(id) => found(self.client.get_permission(id)),
            None => Ok(None),
        }
    }

    fn normalized(config: &PermissionConfig) -> PermissionConfig {
        permission::from_api(&permission::to_api(config, ""))
    }
}

impl Resource for PermissionResource {
    fn id(&self) -> String {
        self.label.clone()
    }

    fn description(&self) -> String {
        match &self.desired {
            Some(config) => format!(
                "Allow team {} to {} {}",
                config.team, config.action, config.resource
            ),
            None => format!("Remove permission {}", self.identity.as_deref().unwrap_or("?")),
        }
    }

    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn validate(&self) -> Result<()> {
        if let Some(config) = &self.desired {
            config.validate()?;
        }
        Ok(())
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(match self.read()? {
            Some(remote) => rendered(&permission::from_api(&remote)),
            None => ResourceState::Absent,
        })
    }

    fn desired_state(&self) -> ResourceState {
        match &self.desired {
            Some(config) => rendered(&Self::normalized(config)),
            None => ResourceState::Absent,
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let remote = self.read()?;
        let Some(config) = &self.desired else {
            if let Some(remote) = remote {
                self.client
                    .delete_permission(&remote.id)
                    .with_context(|| format!("Failed to delete permission {}", remote.id))?;
            }
            ctx.recorder.forget(RESOURCE_TYPE, &self.label);
            return Ok(ApplyResult::Removed);
        };

        let normalized = Self::normalized(config);
        let snapshot = Some(render(&normalized)?);

        let Some(remote) = remote else {
            let created = self
                .client
                .create_permission(&permission::to_api(config, ""))
                .with_context(|| format!("Failed to create permission {}", self.label))?;
            ctx.recorder
                .record(RESOURCE_TYPE, &self.label, &created.id, snapshot);
            return Ok(ApplyResult::Created);
        };

        let change = permission::plan_change(&permission::from_api(&remote), &normalized);
        let id = permission::apply_change(&self.client, &remote.id, config, change)
            .with_context(|| format!("Failed to update permission {}", remote.id))?;
        ctx.recorder.record(RESOURCE_TYPE, &self.label, &id, snapshot);

        Ok(match change {
            PermissionChange::None => ApplyResult::NoChange,
            PermissionChange::UpdateTags => ApplyResult::Modified,
            PermissionChange::Replace => ApplyResult::Replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ProjectResource;
    use crate::resource::testing::client;
    use crate::schema::ProjectConfig;
    use crate::state::SyncState;
    use cfclient::{Method, MockTransport};
    use declarative::{ExecuteOptions, ExecutionPlan, execute_simple};

    const REMOTE: &str =
        r#"{"_id":"a1","team":"t1","resource":"pipeline","action":"run","tags":["*","untagged"]}"#;

    fn declared() -> PermissionConfig {
        PermissionConfig {
            team: "t1".into(),
            resource: "pipeline".into(),
            action: "run".into(),
            ..Default::default()
        }
    }

    fn apply(resource: &PermissionResource, state: &mut SyncState) -> ApplyResult {
        let mut ctx = ApplyContext::new(false, false, state);
        resource.apply(&mut ctx).unwrap()
    }

    #[test]
    fn test_default_tags_match_remote() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "/abac/a1", 200, REMOTE);

        let resource =
            PermissionResource::new(client(&mock), "runners", Some(declared()), Some("a1".into()));
        assert_eq!(resource.current_state().unwrap(), resource.desired_state());
    }

    #[test]
    fn test_tag_change_is_one_put() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "/abac/a1", 200, REMOTE);
        mock.respond(Method::Put, "/abac/a1", 200, "{}");

        let mut desired = declared();
        desired.tags = vec!["web".into()];
        let resource =
            PermissionResource::new(client(&mock), "runners", Some(desired), Some("a1".into()));

        let mut state = SyncState::default();
        assert_eq!(apply(&resource, &mut state), ApplyResult::Modified);
        assert_eq!(mock.methods(), vec![Method::Get, Method::Put]);
        assert_eq!(state.identity("permission", "runners").as_deref(), Some("a1"));
    }

    #[test]
    fn test_team_change_records_new_id() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "/abac/a1", 200, REMOTE);
        mock.respond(Method::Delete, "/abac/a1", 200, "");
        mock.respond(
            Method::Post,
            "/abac",
            200,
            r#"{"_id":"a2","team":"t2","resource":"pipeline","action":"run"}"#,
        );

        let mut desired = declared();
        desired.team = "t2".into();
        let resource =
            PermissionResource::new(client(&mock), "runners", Some(desired), Some("a1".into()));

        let mut state = SyncState::default();
        assert_eq!(apply(&resource, &mut state), ApplyResult::Replaced);
        assert_eq!(mock.count(Method::Put), 0);
        assert_eq!(state.identity("permission", "runners").as_deref(), Some("a2"));
    }

    #[test]
    fn test_invalid_permission_stops_before_any_request() {
        let mock = MockTransport::new();
        let client = client(&mock);

        let mut bad = declared();
        bad.resource = "project".into();
        bad.related_resource = Some("project".into());

        let mut plan = ExecutionPlan::new();
        plan.add_resource(Box::new(ProjectResource::new(
            client.clone(),
            "web",
            Some(ProjectConfig {
                name: "web".into(),
                ..Default::default()
            }),
            None,
        )));
        plan.add_resource(Box::new(PermissionResource::new(
            client,
            "runners",
            Some(bad),
            Some("a1".into()),
        )));

        let mut state = SyncState::default();
        let err = execute_simple(plan, ExecuteOptions::default(), &mut state).unwrap_err();

        assert!(err.to_string().contains("permission.runners"));
        assert!(mock.requests().is_empty());
        assert!(state.resources.is_empty());
    }
}
