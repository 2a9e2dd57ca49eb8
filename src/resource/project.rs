//! Project resource

use anyhow::{Context as _, Result};
use cfclient::{Client, Project};
use std::sync::Arc;

use super::{ApplyContext, ApplyResult, Resource, found, rendered};
use crate::mapping::{project, render};
use crate::schema::ProjectConfig;
use declarative::ResourceState;

pub const RESOURCE_TYPE: &str = "project";

/// A project, addressed by the ID the service issued
#[derive(Debug)]
pub struct ProjectResource {
    client: Arc<Client>,
    label: String,
    desired: Option<ProjectConfig>,
    identity: Option<String>,
}

impl ProjectResource {
    pub fn new(
        client: Arc<Client>,
        label: &str,
        desired: Option<ProjectConfig>,
        identity: Option<String>,
    ) -> Self {
        Self {
            client,
            label: label.to_string(),
            desired,
            identity,
        }
    }

    fn read(&self) -> Result<Option<Project>> {
        match &self.identity {
            Some(id) => found(self.client.get_project(id)),
            None => Ok(None),
        }
    }

    fn normalized(config: &ProjectConfig) -> ProjectConfig {
        project::from_api(&project::to_api(config, ""))
    }
}

impl Resource for ProjectResource {
    fn id(&self) -> String {
        self.label.clone()
    }

    fn description(&self) -> String {
        match &self.desired {
            Some(config) => format!("Project {}", config.name),
            None => format!("Remove project {}", self.identity.as_deref().unwrap_or("?")),
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
            Some(remote) => rendered(&project::from_api(&remote)),
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
                    .delete_project(&remote.id)
                    .with_context(|| format!("Failed to delete project {}", remote.project_name))?;
            }
            ctx.recorder.forget(RESOURCE_TYPE, &self.label);
            return Ok(ApplyResult::Removed);
        };

        let normalized = Self::normalized(config);
        let snapshot = Some(render(&normalized)?);

        match remote {
            None => {
                let created = self
                    .client
                    .create_project(&project::to_api(config, ""))
                    .with_context(|| format!("Failed to create project {}", config.name))?;
                ctx.recorder.record(RESOURCE_TYPE, &self.label, &created.id, snapshot);
                Ok(ApplyResult::Created)
            }
            Some(remote) if project::from_api(&remote) == normalized => {
                ctx.recorder.record(RESOURCE_TYPE, &self.label, &remote.id, snapshot);
                Ok(ApplyResult::NoChange)
            }
            Some(remote) => {
                self.client
                    .update_project(&project::to_api(config, &remote.id))
                    .with_context(|| format!("Failed to update project {}", config.name))?;
                ctx.recorder.record(RESOURCE_TYPE, &self.label, &remote.id, snapshot);
                Ok(ApplyResult::Modified)
            }
        }
    }
}
