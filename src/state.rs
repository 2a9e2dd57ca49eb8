//! Persisted identities of managed objects
//!
//! The state file maps each address (`<type>.<label>`) to the identity the
//! remote object is known by, plus a snapshot of the configuration last
//! applied or imported. It is written after every apply, including failed
//! ones, so identities of objects created before the failure are kept.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::StateRecorder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ============================================================================
// State Structures
// ============================================================================

/// Main state structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncState {
    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,

    /// Managed objects by address
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRecord>,
}

/// What is known about one managed object
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Context name, or the ID the service issued
    pub identity: String,

    /// Canonical JSON of the configuration last applied; secrets are masked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

/// `<type>.<label>`
pub fn address(resource_type: &str, label: &str) -> String {
    format!("{resource_type}.{label}")
}

// ============================================================================
// SyncState Implementation
// ============================================================================

impl SyncState {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, using empty state", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        self.save(path)
    }

    /// Record for a resource, if any
    pub fn get(&self, resource_type: &str, label: &str) -> Option<&ResourceRecord> {
        self.resources.get(&address(resource_type, label))
    }

    /// Identity for a resource, if any
    pub fn identity(&self, resource_type: &str, label: &str) -> Option<String> {
        self.get(resource_type, label).map(|r| r.identity.clone())
    }

    /// Labels of recorded resources of one type
    pub fn labels(&self, resource_type: &str) -> Vec<String> {
        let prefix = format!("{resource_type}.");
        self.resources
            .keys()
            .filter_map(|a| a.strip_prefix(&prefix).map(ToString::to_string))
            .collect()
    }
}

impl StateRecorder for SyncState {
    fn record(&mut self, resource_type: &str, id: &str, identity: &str, snapshot: Option<String>) {
        log::debug!("recording {resource_type}.{id} as {identity}");
        self.resources.insert(
            address(resource_type, id),
            ResourceRecord {
                identity: identity.to_string(),
                snapshot,
            },
        );
    }

    fn forget(&mut self, resource_type: &str, id: &str) {
        log::debug!("forgetting {resource_type}.{id}");
        self.resources.remove(&address(resource_type, id));
    }
}
