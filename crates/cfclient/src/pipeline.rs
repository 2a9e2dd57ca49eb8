//! Pipeline endpoints.

use crate::client::{Client, RequestOptions};
use crate::error::{Error, Result};
use crate::variables::{Variable, null_as_default};
use serde::{Deserialize, Serialize};

/// A build/deploy workflow definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: PipelineSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub project_id: String,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labels {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub triggers: Vec<Trigger>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: Vec<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_template: Option<SpecTemplate>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub concurrency: i64,
}

/// A git (or other) event source that starts the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub trigger_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub repo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub branch_regex: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub modified_files_glob: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: Vec<Variable>,
}

/// Where the pipeline's YAML lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecTemplate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub repo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub revision: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: String,
}

impl SpecTemplate {
    /// Whether every field is empty (the API sends this for inline pipelines).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Client {
    /// Create a pipeline and return the stored representation.
    pub fn create_pipeline(&self, pipeline: &Pipeline) -> Result<Pipeline> {
        let created: Pipeline =
            self.execute_json(&RequestOptions::post("/pipelines").json(pipeline)?)?;
        if created.metadata.id.is_empty() {
            return Err(Error::EmptyResponse("POST /pipelines".to_string()));
        }
        Ok(created)
    }

    /// Fetch a pipeline by ID.
    pub fn get_pipeline(&self, id: &str) -> Result<Pipeline> {
        self.execute_json(&RequestOptions::get(format!("/pipelines/{id}")))
    }

    /// Replace a pipeline. `pipeline.metadata.id` selects the target.
    pub fn update_pipeline(&self, pipeline: &Pipeline) -> Result<Pipeline> {
        let options =
            RequestOptions::put(format!("/pipelines/{}", pipeline.metadata.id)).json(pipeline)?;
        self.execute_json(&options)
    }

    /// Delete a pipeline by ID.
    pub fn delete_pipeline(&self, id: &str) -> Result<()> {
        self.execute(&RequestOptions::delete(format!("/pipelines/{id}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::transport::{Method, MockTransport};

    #[test]
    fn test_decode_api_payload() {
        let body = r#"{
            "metadata": {
                "id": "5f1",
                "name": "web/build",
                "projectId": "p1",
                "labels": {"tags": ["a"]}
            },
            "spec": {
                "triggers": [{
                    "name": "push",
                    "type": "git",
                    "repo": "org/web",
                    "events": ["push.heads"],
                    "branchRegex": "/.*/gi",
                    "modifiedFilesGlob": "",
                    "provider": "github",
                    "disabled": false,
                    "context": "github",
                    "variables": null
                }],
                "variables": [{"key": "A", "value": "1"}],
                "specTemplate": {
                    "location": "git",
                    "repo": "org/web",
                    "path": "./codefresh.yml",
                    "revision": "main",
                    "context": "github"
                },
                "priority": 1,
                "concurrency": 2
            }
        }"#;

        let pipeline: Pipeline = serde_json::from_str(body).unwrap();
        assert_eq!(pipeline.metadata.project_id, "p1");
        assert_eq!(pipeline.spec.triggers[0].trigger_type, "git");
        assert_eq!(pipeline.spec.triggers[0].branch_regex, "/.*/gi");
        assert!(pipeline.spec.triggers[0].variables.is_empty());
        assert_eq!(pipeline.spec.concurrency, 2);
        assert!(!pipeline.spec.spec_template.unwrap().is_empty());
    }

    #[test]
    fn test_encode_omits_empty_identity() {
        let pipeline = Pipeline {
            metadata: Metadata {
                name: "build".to_string(),
                ..Default::default()
            },
            spec: PipelineSpec::default(),
        };
        let json = serde_json::to_value(&pipeline).unwrap();
        assert!(json["metadata"].get("id").is_none());
        assert!(json["metadata"].get("projectId").is_none());
        assert!(json["spec"].get("specTemplate").is_none());
    }

    #[test]
    fn test_update_uses_put_on_id() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Put,
            "/pipelines/5f1",
            200,
            r#"{"metadata":{"id":"5f1","name":"build"}}"#,
        );
        let client =
            Client::with_transport(ClientConfig::new("http://mock", "t"), Box::new(mock.clone()));

        let mut pipeline = Pipeline::default();
        pipeline.metadata.id = "5f1".to_string();
        let updated = client.update_pipeline(&pipeline).unwrap();
        assert_eq!(updated.metadata.name, "build");
        assert_eq!(mock.count(Method::Put), 1);
    }
}
