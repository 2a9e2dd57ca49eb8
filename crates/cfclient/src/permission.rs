//! Permission (ABAC rule) endpoints.

use crate::client::{Client, RequestOptions};
use crate::error::{Error, Result};
use crate::variables::null_as_default;
use serde::{Deserialize, Serialize};

/// A tag-scoped rule granting a team an action on a kind of resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub team: String,
    pub resource: String,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub related_resource: String,
    pub action: String,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub account: String,
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub rule_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl Client {
    /// Create a permission. The service issues a fresh ID.
    pub fn create_permission(&self, permission: &Permission) -> Result<Permission> {
        let created: Permission =
            self.execute_json(&RequestOptions::post("/abac").json(permission)?)?;
        if created.id.is_empty() {
            return Err(Error::EmptyResponse("POST /abac".to_string()));
        }
        Ok(created)
    }

    /// Fetch a permission by ID.
    pub fn get_permission(&self, id: &str) -> Result<Permission> {
        self.execute_json(&RequestOptions::get(format!("/abac/{id}")))
    }

    /// Update a permission's tags. No other field can change in place.
    pub fn update_permission_tags(&self, permission: &Permission) -> Result<()> {
        let options = RequestOptions::put(format!("/abac/{}", permission.id)).json(permission)?;
        self.execute(&options)?;
        Ok(())
    }

    /// Delete a permission by ID.
    pub fn delete_permission(&self, id: &str) -> Result<()> {
        self.execute(&RequestOptions::delete(format!("/abac/{id}")))?;
        Ok(())
    }
}
