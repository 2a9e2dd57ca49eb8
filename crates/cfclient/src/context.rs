//! Context endpoints.

use crate::client::{Client, RequestOptions};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named configuration or secret bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub metadata: ContextMetadata,
    pub spec: ContextSpec,
}

impl Context {
    /// Build a context with the standard `apiVersion` and `kind`.
    pub fn new(name: impl Into<String>, spec: ContextSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ContextMetadata { name: name.into() },
            spec,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub name: String,
}

/// Variant tag plus the variant's data, exactly as the API carries them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSpec {
    #[serde(rename = "type")]
    pub context_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "context".to_string()
}

impl Client {
    /// Create a context.
    pub fn create_context(&self, context: &Context) -> Result<Context> {
        let created: Context = self.execute_json(&RequestOptions::post("/contexts").json(context)?)?;
        if created.metadata.name.is_empty() {
            return Err(Error::EmptyResponse("POST /contexts".to_string()));
        }
        Ok(created)
    }

    /// Fetch a context by name.
    ///
    /// With `decrypt` set the service returns encrypted variants in
    /// cleartext; otherwise their values come back masked.
    pub fn get_context(&self, name: &str, decrypt: bool) -> Result<Context> {
        let mut options = RequestOptions::get(format!("/contexts/{name}"));
        if decrypt {
            options = options.query_param("decrypt", "true");
        }
        self.execute_json(&options)
    }

    /// Replace a context. The name selects the target.
    pub fn update_context(&self, context: &Context) -> Result<Context> {
        let options =
            RequestOptions::put(format!("/contexts/{}", context.metadata.name)).json(context)?;
        self.execute_json(&options)
    }

    /// Delete a context by name.
    pub fn delete_context(&self, name: &str) -> Result<()> {
        self.execute(&RequestOptions::delete(format!("/contexts/{name}")))?;
        Ok(())
    }
}
