//! Project endpoints.

use crate::client::{Client, RequestOptions};
use crate::error::{Error, Result};
use crate::variables::{Variable, null_as_default};
use serde::{Deserialize, Serialize};

/// A project groups pipelines and shares variables with them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub project_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: Vec<Variable>,
}

impl Client {
    /// Create a project and return the stored representation.
    pub fn create_project(&self, project: &Project) -> Result<Project> {
        let created: Project = self.execute_json(&RequestOptions::post("/projects").json(project)?)?;
        if created.id.is_empty() {
            return Err(Error::EmptyResponse("POST /projects".to_string()));
        }
        Ok(created)
    }

    /// Fetch a project by ID.
    pub fn get_project(&self, id: &str) -> Result<Project> {
        self.execute_json(&RequestOptions::get(format!("/projects/{id}")))
    }

    /// Update a project in place. `project.id` selects the target.
    pub fn update_project(&self, project: &Project) -> Result<()> {
        let options = RequestOptions::patch(format!("/projects/{}", project.id)).json(project)?;
        self.execute(&options)?;
        Ok(())
    }

    /// Delete a project by ID.
    pub fn delete_project(&self, id: &str) -> Result<()> {
        self.execute(&RequestOptions::delete(format!("/projects/{id}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::transport::{Method, MockTransport};

    fn client(mock: &MockTransport) -> Client {
        Client::with_transport(ClientConfig::new("http://mock", "t"), Box::new(mock.clone()))
    }

    #[test]
    fn test_wire_format() {
        let project = Project {
            id: String::new(),
            project_name: "web".to_string(),
            tags: vec!["frontend".to_string()],
            variables: vec![Variable::new("REGION", "eu")],
        };
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "projectName": "web",
                "tags": ["frontend"],
                "variables": [{"key": "REGION", "value": "eu"}]
            })
        );
    }

    #[test]
    fn test_create_requires_id() {
        let mock = MockTransport::new();
        mock.respond(Method::Post, "/projects", 200, r#"{"projectName":"web"}"#);

        let err = client(&mock)
            .create_project(&Project::default())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyResponse(_)));
    }

    #[test]
    fn test_crud_paths() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Post,
            "/projects",
            200,
            r#"{"id":"p1","projectName":"web","tags":null}"#,
        );
        mock.respond(Method::Get, "/projects/p1", 200, r#"{"id":"p1","projectName":"web"}"#);
        mock.respond(Method::Patch, "/projects/p1", 200, "{}");
        mock.respond(Method::Delete, "/projects/p1", 200, "");

        let client = client(&mock);
        let created = client.create_project(&Project::default()).unwrap();
        assert_eq!(created.id, "p1");
        assert!(created.tags.is_empty());

        let fetched = client.get_project("p1").unwrap();
        client.update_project(&fetched).unwrap();
        client.delete_project("p1").unwrap();

        assert_eq!(
            mock.methods(),
            vec![Method::Post, Method::Get, Method::Patch, Method::Delete]
        );
    }
}
