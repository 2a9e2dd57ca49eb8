//! Manifest schema: the declarative shape of every managed object
//!
//! A manifest groups typed configs by a local label:
//!
//! ```toml
//! [projects.web]
//! name = "web"
//! tags = ["frontend"]
//!
//! [pipelines.build]
//! name = "web/build"
//! project_id = "5f1c..."
//!
//! [[pipelines.build.spec.trigger]]
//! repo = "acme/web"
//! events = ["push.heads"]
//!
//! [contexts.shared]
//! name = "shared-config"
//! spec.config.data = { REGION = "eu-west-1" }
//!
//! [permissions.deployers]
//! team = "5f1d..."
//! resource = "pipeline"
//! action = "run"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// Validation Errors
// ============================================================================

/// A declared value the API would reject, detected before any network I/O
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} = {value:?} is not one of: {}", .allowed.join(", "))]
    NotAllowed {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("related_resource is only valid when resource is 'pipeline' (resource = {resource:?})")]
    RelatedResourceRequiresPipeline { resource: String },

    #[error("action {action} is only valid when resource is 'pipeline' (resource = {resource:?})")]
    ActionRequiresPipeline { action: String, resource: String },

    #[error("spec must populate exactly one of: {}", ContextKind::FIELDS.join(", "))]
    NoContextVariant,

    #[error("spec populates more than one variant: {}", .found.join(", "))]
    MultipleContextVariants { found: Vec<&'static str> },

    #[error("spec.{field}.data is not valid YAML: {message}")]
    InvalidYaml { field: &'static str, message: String },

    #[error("spec.spec_template.{field} is required when spec_template is set")]
    SpecTemplateIncomplete { field: &'static str },

    #[error("context name {name:?} is declared by both '{first}' and '{second}'")]
    DuplicateContextName {
        name: String,
        first: String,
        second: String,
    },
}

// ============================================================================
// Manifest
// ============================================================================

/// Every object cfsync manages, keyed by local label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub projects: BTreeMap<String, ProjectConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pipelines: BTreeMap<String, PipelineConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contexts: BTreeMap<String, ContextConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub permissions: BTreeMap<String, PermissionConfig>,
}

impl Manifest {
    /// Validate every declared object, collecting `(address, error)` pairs
    pub fn validate(&self) -> Vec<(String, ValidationError)> {
        let mut problems = Vec::new();

        for (label, project) in &self.projects {
            if let Err(e) = project.validate() {
                problems.push((format!("project.{label}"), e));
            }
        }
        for (label, pipeline) in &self.pipelines {
            if let Err(e) = pipeline.validate() {
                problems.push((format!("pipeline.{label}"), e));
            }
        }
        for (label, context) in &self.contexts {
            if let Err(e) = context.validate() {
                problems.push((format!("context.{label}"), e));
            }
        }
        for (label, permission) in &self.permissions {
            if let Err(e) = permission.validate() {
                problems.push((format!("permission.{label}"), e));
            }
        }

        // Contexts are addressed remotely by name
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for (label, context) in &self.contexts {
            if let Some(first) = seen.insert(context.name.as_str(), label.as_str()) {
                problems.push((
                    format!("context.{label}"),
                    ValidationError::DuplicateContextName {
                        name: context.name.clone(),
                        first: first.to_string(),
                        second: label.clone(),
                    },
                ));
            }
        }

        problems
    }

    /// Whether `label` is declared under `resource_type`
    pub fn declares(&self, resource_type: &str, label: &str) -> bool {
        match resource_type {
            "project" => self.projects.contains_key(label),
            "pipeline" => self.pipelines.contains_key(label),
            "context" => self.contexts.contains_key(label),
            "permission" => self.permissions.contains_key(label),
            _ => false,
        }
    }

    /// Number of declared objects
    pub fn len(&self) -> usize {
        self.projects.len() + self.pipelines.len() + self.contexts.len() + self.permissions.len()
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

fn one_of(
    field: &'static str,
    value: &str,
    allowed: &'static [&'static str],
) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::NotAllowed {
            field,
            value: value.to_string(),
            allowed,
        })
    }
}

// ============================================================================
// Project
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl ProjectConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Full name, usually `<project>/<pipeline>`
    pub name: String,

    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub spec: PipelineSpecConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;

        if let Some(template) = &self.spec.spec_template {
            for (field, value) in [
                ("repo", &template.repo),
                ("path", &template.path),
                ("revision", &template.revision),
            ] {
                if value.trim().is_empty() {
                    return Err(ValidationError::SpecTemplateIncomplete { field });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSpecConfig {
    #[serde(default)]
    pub priority: i64,

    /// Maximum concurrent builds; zero is unlimited
    #[serde(default)]
    pub concurrency: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_template: Option<SpecTemplateConfig>,

    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    #[serde(default, rename = "trigger")]
    pub triggers: Vec<TriggerConfig>,
}

/// Where the pipeline YAML lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecTemplateConfig {
    #[serde(default = "default_location")]
    pub location: String,

    pub repo: String,

    pub path: String,

    pub revision: String,

    #[serde(default = "default_git_context")]
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type", default = "default_trigger_type")]
    pub trigger_type: String,

    #[serde(default)]
    pub repo: String,

    #[serde(default = "default_branch_regex")]
    pub branch_regex: String,

    #[serde(default)]
    pub modified_files_glob: String,

    #[serde(default)]
    pub events: Vec<String>,

    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default = "default_git_context")]
    pub context: String,

    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            trigger_type: default_trigger_type(),
            repo: String::new(),
            branch_regex: default_branch_regex(),
            modified_files_glob: String::new(),
            events: Vec::new(),
            provider: default_provider(),
            disabled: false,
            context: default_git_context(),
            variables: BTreeMap::new(),
        }
    }
}

fn default_location() -> String {
    "git".to_string()
}

fn default_trigger_type() -> String {
    "git".to_string()
}

fn default_branch_regex() -> String {
    "/.*/gi".to_string()
}

fn default_provider() -> String {
    "github".to_string()
}

fn default_git_context() -> String {
    "github".to_string()
}

// ============================================================================
// Context
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    pub name: String,

    /// Read encrypted contexts decrypted; when false their content is not
    /// compared against the API
    #[serde(default = "default_true")]
    pub decrypt_spec: bool,

    pub spec: ContextSpecBlock,
}

fn default_true() -> bool {
    true
}

impl ContextConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        let spec = self.spec.to_spec()?;

        if let ContextSpec::Yaml(data) | ContextSpec::SecretYaml(data) = &spec
            && let Err(e) = serde_yaml::from_str::<serde_yaml::Mapping>(data)
        {
            return Err(ValidationError::InvalidYaml {
                field: spec.kind().field(),
                message: e.to_string(),
            });
        }
        Ok(())
    }
}

/// The seven mutually exclusive variant blocks as they appear in a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextSpecBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<MapData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<MapData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaml: Option<YamlData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_yaml: Option<YamlData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_gc: Option<StorageData<JsonConfigAuth>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_s3: Option<StorageData<JsonConfigAuth>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_azuref: Option<StorageData<AzureAuth>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapData {
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlData {
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageData<A> {
    pub data: StorageAuth<A>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageAuth<A> {
    pub auth: A,
}

/// Credentials for Google Cloud Storage and S3 contexts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonConfigAuth {
    #[serde(rename = "type")]
    pub auth_type: String,

    pub json_config: BTreeMap<String, String>,
}

/// Credentials for Azure file storage contexts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AzureAuth {
    #[serde(rename = "type")]
    pub auth_type: String,

    pub account_name: String,

    pub account_key: String,
}

/// A variant block counts only when it carries data
trait HasData {
    fn has_data(&self) -> bool;
}

impl HasData for MapData {
    fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}

impl HasData for YamlData {
    fn has_data(&self) -> bool {
        !self.data.trim().is_empty()
    }
}

impl HasData for JsonConfigAuth {
    fn has_data(&self) -> bool {
        !self.auth_type.is_empty() || !self.json_config.is_empty()
    }
}

impl HasData for AzureAuth {
    fn has_data(&self) -> bool {
        !self.auth_type.is_empty() || !self.account_name.is_empty() || !self.account_key.is_empty()
    }
}

impl<A: HasData> HasData for StorageData<A> {
    fn has_data(&self) -> bool {
        self.data.auth.has_data()
    }
}

fn has_data<T: HasData>(block: Option<&T>) -> bool {
    block.is_some_and(HasData::has_data)
}

/// Context variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    Config,
    Secret,
    Yaml,
    SecretYaml,
    StorageGc,
    StorageS3,
    StorageAzure,
}

impl ContextKind {
    /// Detection precedence
    pub const ALL: [Self; 7] = [
        Self::Config,
        Self::Secret,
        Self::Yaml,
        Self::SecretYaml,
        Self::StorageGc,
        Self::StorageS3,
        Self::StorageAzure,
    ];

    /// Manifest field names, in detection precedence
    pub const FIELDS: [&'static str; 7] = [
        "config",
        "secret",
        "yaml",
        "secret_yaml",
        "storage_gc",
        "storage_s3",
        "storage_azuref",
    ];

    /// The API's `spec.type`
    pub fn api_type(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Secret => "secret",
            Self::Yaml => "yaml",
            Self::SecretYaml => "secret-yaml",
            Self::StorageGc => "storage.gc",
            Self::StorageS3 => "storage.s3",
            Self::StorageAzure => "storage.azuref",
        }
    }

    pub fn from_api_type(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.api_type() == value)
    }

    /// Field name in a manifest `spec` block
    pub fn field(self) -> &'static str {
        match self {
            Self::Config => Self::FIELDS[0],
            Self::Secret => Self::FIELDS[1],
            Self::Yaml => Self::FIELDS[2],
            Self::SecretYaml => Self::FIELDS[3],
            Self::StorageGc => Self::FIELDS[4],
            Self::StorageS3 => Self::FIELDS[5],
            Self::StorageAzure => Self::FIELDS[6],
        }
    }

    /// Whether the API stores this variant encrypted
    pub fn is_encrypted(self) -> bool {
        matches!(
            self,
            Self::Secret | Self::SecretYaml | Self::StorageS3 | Self::StorageAzure
        )
    }
}

/// Exactly one populated context variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextSpec {
    Config(BTreeMap<String, String>),
    Secret(BTreeMap<String, String>),
    Yaml(String),
    SecretYaml(String),
    StorageGc(JsonConfigAuth),
    StorageS3(JsonConfigAuth),
    StorageAzure(AzureAuth),
}

impl ContextSpec {
    pub fn kind(&self) -> ContextKind {
        match self {
            Self::Config(_) => ContextKind::Config,
            Self::Secret(_) => ContextKind::Secret,
            Self::Yaml(_) => ContextKind::Yaml,
            Self::SecretYaml(_) => ContextKind::SecretYaml,
            Self::StorageGc(_) => ContextKind::StorageGc,
            Self::StorageS3(_) => ContextKind::StorageS3,
            Self::StorageAzure(_) => ContextKind::StorageAzure,
        }
    }
}

impl ContextSpecBlock {
    /// Variants with non-empty data, in detection precedence
    pub fn populated(&self) -> Vec<ContextKind> {
        let present = [
            has_data(self.config.as_ref()),
            has_data(self.secret.as_ref()),
            has_data(self.yaml.as_ref()),
            has_data(self.secret_yaml.as_ref()),
            has_data(self.storage_gc.as_ref()),
            has_data(self.storage_s3.as_ref()),
            has_data(self.storage_azuref.as_ref()),
        ];
        ContextKind::ALL
            .into_iter()
            .zip(present)
            .filter_map(|(kind, present)| present.then_some(kind))
            .collect()
    }

    /// First non-empty variant in precedence order; `None` when there is none
    pub fn detect_kind(&self) -> Option<ContextKind> {
        self.populated().first().copied()
    }

    /// Convert to the sum type, rejecting empty and ambiguous blocks
    pub fn to_spec(&self) -> Result<ContextSpec, ValidationError> {
        let populated = self.populated();
        if populated.len() > 1 {
            return Err(ValidationError::MultipleContextVariants {
                found: populated.into_iter().map(ContextKind::field).collect(),
            });
        }

        let spec = match populated.first() {
            None => return Err(ValidationError::NoContextVariant),
            Some(ContextKind::Config) => self
                .config
                .as_ref()
                .map(|d| ContextSpec::Config(d.data.clone())),
            Some(ContextKind::Secret) => self
                .secret
                .as_ref()
                .map(|d| ContextSpec::Secret(d.data.clone())),
            Some(ContextKind::Yaml) => self.yaml.as_ref().map(|d| ContextSpec::Yaml(d.data.clone())),
            Some(ContextKind::SecretYaml) => self
                .secret_yaml
                .as_ref()
                .map(|d| ContextSpec::SecretYaml(d.data.clone())),
            Some(ContextKind::StorageGc) => self
                .storage_gc
                .as_ref()
                .map(|d| ContextSpec::StorageGc(d.data.auth.clone())),
            Some(ContextKind::StorageS3) => self
                .storage_s3
                .as_ref()
                .map(|d| ContextSpec::StorageS3(d.data.auth.clone())),
            Some(ContextKind::StorageAzure) => self
                .storage_azuref
                .as_ref()
                .map(|d| ContextSpec::StorageAzure(d.data.auth.clone())),
        };
        spec.ok_or(ValidationError::NoContextVariant)
    }
}

impl From<ContextSpec> for ContextSpecBlock {
    fn from(spec: ContextSpec) -> Self {
        let mut block = Self::default();
        match spec {
            ContextSpec::Config(data) => block.config = Some(MapData { data }),
            ContextSpec::Secret(data) => block.secret = Some(MapData { data }),
            ContextSpec::Yaml(data) => block.yaml = Some(YamlData { data }),
            ContextSpec::SecretYaml(data) => block.secret_yaml = Some(YamlData { data }),
            ContextSpec::StorageGc(auth) => {
                block.storage_gc = Some(StorageData {
                    data: StorageAuth { auth },
                });
            }
            ContextSpec::StorageS3(auth) => {
                block.storage_s3 = Some(StorageData {
                    data: StorageAuth { auth },
                });
            }
            ContextSpec::StorageAzure(auth) => {
                block.storage_azuref = Some(StorageData {
                    data: StorageAuth { auth },
                });
            }
        }
        block
    }
}

// ============================================================================
// Permission
// ============================================================================

pub const PERMISSION_RESOURCES: &[&str] = &["pipeline", "cluster", "project"];
pub const PERMISSION_ACTIONS: &[&str] = &[
    "create", "read", "update", "delete", "run", "approve", "debug",
];
pub const PERMISSION_RELATED_RESOURCES: &[&str] = &["project"];
pub const PERMISSION_RULE_TYPES: &[&str] = &["all", "any"];

/// Actions the API accepts only for pipelines
const PIPELINE_ONLY_ACTIONS: &[&str] = &["run", "approve", "debug"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionConfig {
    /// Team ID
    pub team: String,

    pub resource: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_resource: Option<String>,

    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,

    /// `*` matches any tag and `untagged` matches untagged objects; empty
    /// means both
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PermissionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("team", &self.team)?;
        one_of("resource", &self.resource, PERMISSION_RESOURCES)?;
        one_of("action", &self.action, PERMISSION_ACTIONS)?;
        if let Some(related) = &self.related_resource {
            one_of("related_resource", related, PERMISSION_RELATED_RESOURCES)?;
        }
        if let Some(rule_type) = &self.rule_type {
            one_of("rule_type", rule_type, PERMISSION_RULE_TYPES)?;
        }

        if self.related_resource.is_some() && self.resource != "pipeline" {
            return Err(ValidationError::RelatedResourceRequiresPipeline {
                resource: self.resource.clone(),
            });
        }
        if PIPELINE_ONLY_ACTIONS.contains(&self.action.as_str()) && self.resource != "pipeline" {
            return Err(ValidationError::ActionRequiresPipeline {
                action: self.action.clone(),
                resource: self.resource.clone(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(resource: &str, action: &str) -> PermissionConfig {
        PermissionConfig {
            team: "t1".to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_full_manifest() {
        let manifest: Manifest = toml::from_str(
            r#"
            [projects.web]
            name = "web"
            tags = ["frontend"]
            variables = { REGION = "eu" }

            [pipelines.build]
            name = "web/build"
            project_id = "p1"

            [[pipelines.build.spec.trigger]]
            repo = "acme/web"
            events = ["push.heads"]

            [contexts.shared]
            name = "shared"
            spec.yaml.data = "a: 1"

            [contexts.bucket]
            name = "bucket"
            decrypt_spec = false
            [contexts.bucket.spec.storage_s3.data.auth]
            type = "basic"
            json_config = { accessKeyId = "id", secretAccessKey = "key" }

            [permissions.run]
            team = "t1"
            resource = "pipeline"
            action = "run"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.len(), 5);
        assert_eq!(manifest.projects["web"].variables["REGION"], "eu");
        assert!(manifest.contexts["shared"].decrypt_spec);
        assert!(!manifest.contexts["bucket"].decrypt_spec);
        assert_eq!(
            manifest.contexts["bucket"].spec.detect_kind(),
            Some(ContextKind::StorageS3)
        );
        assert!(manifest.validate().is_empty());
        assert!(manifest.declares("context", "bucket"));
        assert!(!manifest.declares("project", "bucket"));
    }

    #[test]
    fn test_trigger_defaults() {
        let pipeline: PipelineConfig = toml::from_str(
            r#"
            name = "p"
            [[spec.trigger]]
            repo = "acme/web"
            "#,
        )
        .unwrap();

        let trigger = &pipeline.spec.triggers[0];
        assert_eq!(trigger.trigger_type, "git");
        assert_eq!(trigger.branch_regex, "/.*/gi");
        assert_eq!(trigger.modified_files_glob, "");
        assert_eq!(trigger.provider, "github");
        assert_eq!(trigger.context, "github");
        assert!(!trigger.disabled);
        assert_eq!(
            *trigger,
            TriggerConfig {
                repo: "acme/web".into(),
                ..Default::default()
            }
        );
        assert_eq!(pipeline.spec.priority, 0);
        assert_eq!(pipeline.spec.concurrency, 0);
    }

    #[test]
    fn test_spec_template_defaults_and_validation() {
        let pipeline: PipelineConfig = toml::from_str(
            r#"
            name = "p"
            [spec.spec_template]
            repo = "acme/web"
            path = "./codefresh.yml"
            revision = "main"
            "#,
        )
        .unwrap();
        let template = pipeline.spec.spec_template.as_ref().unwrap();
        assert_eq!(template.location, "git");
        assert_eq!(template.context, "github");
        assert!(pipeline.validate().is_ok());

        let mut broken = pipeline;
        if let Some(t) = broken.spec.spec_template.as_mut() {
            t.revision.clear();
        }
        assert_eq!(
            broken.validate(),
            Err(ValidationError::SpecTemplateIncomplete { field: "revision" })
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ProjectConfig, _> = toml::from_str("name = \"p\"\ncolour = \"red\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_detect_kind_single_and_none() {
        let block = ContextSpecBlock::from(ContextSpec::SecretYaml("a: 1".into()));
        assert_eq!(block.detect_kind(), Some(ContextKind::SecretYaml));
        assert_eq!(ContextSpecBlock::default().detect_kind(), None);
        assert_eq!(
            ContextSpecBlock::default().to_spec(),
            Err(ValidationError::NoContextVariant)
        );
    }

    #[test]
    fn test_detect_kind_uses_precedence() {
        let mut block = ContextSpecBlock::from(ContextSpec::StorageGc(JsonConfigAuth {
            auth_type: "basic".into(),
            json_config: BTreeMap::new(),
        }));
        block.secret = Some(MapData {
            data: BTreeMap::from([("K".into(), "v".into())]),
        });

        assert_eq!(block.detect_kind(), Some(ContextKind::Secret));
        assert_eq!(
            block.to_spec(),
            Err(ValidationError::MultipleContextVariants {
                found: vec!["secret", "storage_gc"]
            })
        );
    }

    #[test]
    fn test_empty_blocks_do_not_count() {
        let mut block = ContextSpecBlock::from(ContextSpec::Secret(BTreeMap::from([(
            "K".into(),
            "v".into(),
        )])));
        block.config = Some(MapData::default());
        block.yaml = Some(YamlData { data: "  \n".into() });
        block.storage_gc = Some(StorageData::default());

        assert_eq!(block.populated(), vec![ContextKind::Secret]);
        assert_eq!(block.detect_kind(), Some(ContextKind::Secret));
        assert!(matches!(block.to_spec(), Ok(ContextSpec::Secret(_))));
    }

    #[test]
    fn test_only_empty_blocks_is_no_variant() {
        let block = ContextSpecBlock {
            config: Some(MapData::default()),
            secret_yaml: Some(YamlData::default()),
            storage_azuref: Some(StorageData::default()),
            ..Default::default()
        };

        assert_eq!(block.detect_kind(), None);
        assert_eq!(block.to_spec(), Err(ValidationError::NoContextVariant));
    }

    #[test]
    fn test_every_kind_round_trips_through_block() {
        let specs = [
            ContextSpec::Config(BTreeMap::from([("a".into(), "1".into())])),
            ContextSpec::Secret(BTreeMap::from([("b".into(), "2".into())])),
            ContextSpec::Yaml("a: 1\n".into()),
            ContextSpec::SecretYaml("b: 2\n".into()),
            ContextSpec::StorageGc(JsonConfigAuth {
                auth_type: "basic".into(),
                json_config: BTreeMap::new(),
            }),
            ContextSpec::StorageS3(JsonConfigAuth {
                auth_type: String::new(),
                json_config: BTreeMap::from([("key".into(), "k".into())]),
            }),
            ContextSpec::StorageAzure(AzureAuth {
                account_name: "acct".into(),
                ..Default::default()
            }),
        ];
        for spec in specs {
            let block = ContextSpecBlock::from(spec.clone());
            assert_eq!(block.detect_kind(), Some(spec.kind()));
            assert_eq!(block.to_spec().unwrap(), spec);
            assert_eq!(ContextKind::from_api_type(spec.kind().api_type()), Some(spec.kind()));
        }
    }

    #[test]
    fn test_encrypted_kinds() {
        let encrypted: Vec<_> = ContextKind::ALL
            .into_iter()
            .filter(|k| k.is_encrypted())
            .map(ContextKind::api_type)
            .collect();
        assert_eq!(
            encrypted,
            vec!["secret", "secret-yaml", "storage.s3", "storage.azuref"]
        );
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let context = ContextConfig {
            name: "c".into(),
            decrypt_spec: true,
            spec: ContextSpecBlock::from(ContextSpec::Yaml("a: [1, 2".into())),
        };
        assert!(matches!(
            context.validate(),
            Err(ValidationError::InvalidYaml { field: "yaml", .. })
        ));
    }

    #[test]
    fn test_duplicate_context_names() {
        let context = ContextConfig {
            name: "same".into(),
            decrypt_spec: true,
            spec: ContextSpecBlock::from(ContextSpec::Config(BTreeMap::from([(
                "K".to_string(),
                "v".to_string(),
            )]))),
        };
        let mut manifest = Manifest::default();
        manifest.contexts.insert("a".into(), context.clone());
        manifest.contexts.insert("b".into(), context);

        let problems = manifest.validate();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].0, "context.b");
    }

    #[test]
    fn test_permission_related_resource_requires_pipeline() {
        let mut p = permission("cluster", "read");
        p.related_resource = Some("project".into());
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("related_resource"));

        let mut p = permission("pipeline", "read");
        p.related_resource = Some("project".into());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_permission_pipeline_only_actions() {
        for action in ["run", "approve", "debug"] {
            let err = permission("cluster", action).validate().unwrap_err();
            assert_eq!(
                err,
                ValidationError::ActionRequiresPipeline {
                    action: action.into(),
                    resource: "cluster".into()
                }
            );
            assert!(permission("pipeline", action).validate().is_ok());
        }
    }

    #[test]
    fn test_permission_allowed_values() {
        let err = permission("repo", "read").validate().unwrap_err();
        assert!(err.to_string().contains("resource"));
        assert!(err.to_string().contains("pipeline, cluster, project"));

        let err = permission("pipeline", "launch").validate().unwrap_err();
        assert!(err.to_string().contains("action"));

        let mut p = permission("pipeline", "read");
        p.rule_type = Some("most".into());
        assert!(p.validate().unwrap_err().to_string().contains("rule_type"));
    }
}
