//! Permission mapping and update strategy
//!
//! The API can only change a permission's tags in place. Any other change
//! is carried out by deleting the rule and creating a new one, which gives
//! it a new ID.

use anyhow::Result;
use cfclient::{Client, Permission};

use crate::mapping::normalize_tags;
use crate::schema::PermissionConfig;

/// Tags sent when none are declared: every tagged and untagged object
pub const DEFAULT_TAGS: [&str; 2] = ["*", "untagged"];

/// Build the API payload; `id` is empty for creates
pub fn to_api(config: &PermissionConfig, id: &str) -> Permission {
    let tags = if config.tags.is_empty() {
        DEFAULT_TAGS.iter().map(ToString::to_string).collect()
    } else {
        normalize_tags(&config.tags)
    };

    Permission {
        id: id.to_string(),
        team: config.team.clone(),
        resource: config.resource.clone(),
        related_resource: config.related_resource.clone().unwrap_or_default(),
        action: config.action.clone(),
        account: String::new(),
        rule_type: config.rule_type.clone().unwrap_or_default(),
        tags,
    }
}

pub fn from_api(permission: &Permission) -> PermissionConfig {
    PermissionConfig {
        team: permission.team.clone(),
        resource: permission.resource.clone(),
        related_resource: non_empty(&permission.related_resource),
        action: permission.action.clone(),
        rule_type: non_empty(&permission.rule_type),
        tags: normalize_tags(&permission.tags),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// How to move a permission from `current` to `desired`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionChange {
    None,
    /// Only tags differ: one in-place update
    UpdateTags,
    /// Team, action, resource, related resource or rule type differ
    Replace,
}

/// Compare two normalized configs
pub fn plan_change(current: &PermissionConfig, desired: &PermissionConfig) -> PermissionChange {
    let identity_changed = current.team != desired.team
        || current.action != desired.action
        || current.related_resource != desired.related_resource
        || current.resource != desired.resource
        || current.rule_type != desired.rule_type;

    if identity_changed {
        PermissionChange::Replace
    } else if current.tags != desired.tags {
        PermissionChange::UpdateTags
    } else {
        PermissionChange::None
    }
}

/// Carry out `change` for the permission stored under `id`
///
/// Returns the ID the permission has afterwards. When replacing, a failed
/// delete is logged and the create still runs.
pub fn apply_change(
    client: &Client,
    id: &str,
    desired: &PermissionConfig,
    change: PermissionChange,
) -> Result<String> {
    match change {
        PermissionChange::None => Ok(id.to_string()),
        PermissionChange::UpdateTags => {
            client.update_permission_tags(&to_api(desired, id))?;
            Ok(id.to_string())
        }
        PermissionChange::Replace => {
            if let Err(e) = client.delete_permission(id) {
                log::warn!("failed to delete permission {id}: {e}");
            }
            let created = client.create_permission(&to_api(desired, ""))?;
            Ok(created.id)
        }
    }
}
