//! Pipeline resource

use anyhow::{Context as _, Result};
use cfclient::{Client, Pipeline};
use std::sync::Arc;

use super::{ApplyContext, ApplyResult, Resource, found, rendered};
use crate::mapping::{pipeline, render};
use crate::schema::PipelineConfig;
use declarative::ResourceState;

pub const RESOURCE_TYPE: &str = "pipeline";

#[derive(Debug)]
pub struct PipelineResource {
    client: Arc<Client>,
    label: String,
    desired: Option<PipelineConfig>,
    identity: Option<String>,
}

impl PipelineResource {
    pub fn new(
        client: Arc<Client>,
        label: &str,
        desired: Option<PipelineConfig>,
        identity: Option<String>,
    ) -> Self {
        Self {
            client,
            label: label.to_string(),
            desired,
            identity,
        }
    }

    fn read(&self) -> Result<Option<Pipeline>> {
        match &self.identity {
            Some(id) => found(self.client.get_pipeline(id)),
            None => Ok(None),
        }
    }

    fn normalized(config: &PipelineConfig) -> PipelineConfig {
        pipeline::from_api(&pipeline::to_api(config, ""))
    }
}

impl Resource for PipelineResource {
    fn id(&self) -> String {
        self.label.clone()
    }

    fn description(&self) -> String {
        match &self.desired {
            Some(config) => format!("Pipeline {}", config.name),
            None => format!("Remove pipeline {}", self.identity.as_deref().unwrap_or("?")),
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
            Some(remote) => rendered(&pipeline::from_api(&remote)),
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
                    .delete_pipeline(&remote.metadata.id)
                    .with_context(|| format!("Failed to delete pipeline {}", remote.metadata.name))?;
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
                    .create_pipeline(&pipeline::to_api(config, ""))
                    .with_context(|| format!("Failed to create pipeline {}", config.name))?;
                ctx.recorder
                    .record(RESOURCE_TYPE, &self.label, &created.metadata.id, snapshot);
                Ok(ApplyResult::Created)
            }
            Some(remote) if pipeline::from_api(&remote) == normalized => {
                ctx.recorder
                    .record(RESOURCE_TYPE, &self.label, &remote.metadata.id, snapshot);
                Ok(ApplyResult::NoChange)
            }
            Some(remote) => {
                let id = remote.metadata.id;
                self.client
                    .update_pipeline(&pipeline::to_api(config, &id))
                    .with_context(|| format!("Failed to update pipeline {}", config.name))?;
                ctx.recorder.record(RESOURCE_TYPE, &self.label, &id, snapshot);
                Ok(ApplyResult::Modified)
            }
        }
    }
}
