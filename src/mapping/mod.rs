//! Two-way mapping between manifest configs and API payloads
//!
//! Every function here is pure: `to_api` builds a fresh payload from the
//! declared config, `from_api` rebuilds a config from whatever the API
//! returned. Desired state is always rendered as `from_api(to_api(config))`
//! so defaults and normalization are applied identically on both sides of a
//! diff.

pub mod context;
pub mod permission;
pub mod pipeline;
pub mod project;

use anyhow::{Context as _, Result};
use serde::Serialize;

/// Tags are sets on the API side
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut tags = tags.to_vec();
    tags.sort();
    tags.dedup();
    tags
}

/// Canonical JSON rendering used for comparison and state snapshots
pub fn render<T: Serialize>(config: &T) -> Result<String> {
    serde_json::to_string_pretty(config).context("Failed to render configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        let tags = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(normalize_tags(&tags), vec!["a", "b"]);
    }

    #[test]
    fn test_render_is_key_ordered() {
        let map = std::collections::BTreeMap::from([("z", 1), ("a", 2)]);
        let rendered = render(&map).unwrap();
        assert!(rendered.find("\"a\"").unwrap() < rendered.find("\"z\"").unwrap());
    }
}
