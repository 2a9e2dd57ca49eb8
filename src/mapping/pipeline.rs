//! Pipeline mapping
//!
//! Triggers are mapped one by one; each trigger's fields are read
//! independently so a trigger without a `type` still gets the `git` default.

use crate::mapping::normalize_tags;
use crate::schema::{PipelineConfig, PipelineSpecConfig, SpecTemplateConfig, TriggerConfig};
use cfclient::{
    Labels, Metadata, Pipeline, PipelineSpec, SpecTemplate, Trigger, variables_from_map,
    variables_to_map,
};

/// Build the API payload; `id` is empty for creates
pub fn to_api(config: &PipelineConfig, id: &str) -> Pipeline {
    Pipeline {
        metadata: Metadata {
            id: id.to_string(),
            name: config.name.clone(),
            project_id: config.project_id.clone(),
            labels: Labels {
                tags: normalize_tags(&config.tags),
            },
        },
        spec: spec_to_api(&config.spec),
    }
}

fn spec_to_api(spec: &PipelineSpecConfig) -> PipelineSpec {
    PipelineSpec {
        triggers: spec.triggers.iter().map(trigger_to_api).collect(),
        variables: variables_from_map(&spec.variables),
        spec_template: spec.spec_template.as_ref().map(|t| SpecTemplate {
            location: t.location.clone(),
            repo: t.repo.clone(),
            path: t.path.clone(),
            revision: t.revision.clone(),
            context: t.context.clone(),
        }),
        priority: spec.priority,
        concurrency: spec.concurrency,
    }
}

fn trigger_to_api(trigger: &TriggerConfig) -> Trigger {
    Trigger {
        name: trigger.name.clone(),
        description: trigger.description.clone(),
        trigger_type: trigger.trigger_type.clone(),
        repo: trigger.repo.clone(),
        events: trigger.events.clone(),
        branch_regex: trigger.branch_regex.clone(),
        modified_files_glob: trigger.modified_files_glob.clone(),
        provider: trigger.provider.clone(),
        disabled: trigger.disabled,
        context: trigger.context.clone(),
        variables: variables_from_map(&trigger.variables),
    }
}

pub fn from_api(pipeline: &Pipeline) -> PipelineConfig {
    let spec = &pipeline.spec;
    PipelineConfig {
        name: pipeline.metadata.name.clone(),
        project_id: pipeline.metadata.project_id.clone(),
        tags: normalize_tags(&pipeline.metadata.labels.tags),
        spec: PipelineSpecConfig {
            priority: spec.priority,
            concurrency: spec.concurrency,
            spec_template: spec
                .spec_template
                .as_ref()
                .filter(|t| !t.is_empty())
                .map(|t| SpecTemplateConfig {
                    location: t.location.clone(),
                    repo: t.repo.clone(),
                    path: t.path.clone(),
                    revision: t.revision.clone(),
                    context: t.context.clone(),
                }),
            variables: variables_to_map(&spec.variables),
            triggers: spec.triggers.iter().map(trigger_from_api).collect(),
        },
    }
}

fn trigger_from_api(trigger: &Trigger) -> TriggerConfig {
    TriggerConfig {
        name: trigger.name.clone(),
        description: trigger.description.clone(),
        trigger_type: trigger.trigger_type.clone(),
        repo: trigger.repo.clone(),
        branch_regex: trigger.branch_regex.clone(),
        modified_files_glob: trigger.modified_files_glob.clone(),
        events: trigger.events.clone(),
        provider: trigger.provider.clone(),
        disabled: trigger.disabled,
        context: trigger.context.clone(),
        variables: variables_to_map(&trigger.variables),
    }
}
