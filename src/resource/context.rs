//! Context resource
//!
//! Contexts are addressed by name. Renaming a context, or switching it to a
//! different variant, deletes the old one and creates a new one. Any other
//! change replaces the stored spec in place.
//!
//! Encrypted values never reach the plan output or the state file: both see
//! the masked rendering from [`crate::mapping::context::mask_sensitive`].
//! The state snapshot is the prior a read is interpreted against, so an
//! encrypted context read without decryption compares the declared config
//! with what was last applied.

use anyhow::{Context as _, Result};
use cfclient::{Client, Context};
use std::sync::Arc;

use super::{ApplyContext, ApplyResult, Resource, found, rendered};
use crate::mapping::{context as mapper, render};
use crate::schema::ContextConfig;
use declarative::ResourceState;

pub const RESOURCE_TYPE: &str = "context";

#[derive(Debug)]
pub struct ContextResource {
    client: Arc<Client>,
    label: String,
    desired: Option<ContextConfig>,
    /// Name of the remote context this label is bound to
    identity: Option<String>,
    snapshot: Option<ContextConfig>,
}

impl ContextResource {
    pub fn new(
        client: Arc<Client>,
        label: &str,
        desired: Option<ContextConfig>,
        identity: Option<String>,
    ) -> Self {
        Self {
            client,
            label: label.to_string(),
            desired,
            identity,
            snapshot: None,
        }
    }

    /// Use the recorded snapshot as the prior for reads
    pub fn with_snapshot(mut self, snapshot: Option<&str>) -> Self {
        self.snapshot = snapshot.and_then(|s| match serde_json::from_str(s) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("ignoring unreadable snapshot for context.{}: {e}", self.label);
                None
            }
        });
        self
    }

    /// Config the remote read is interpreted against
    ///
    /// The snapshot when there is one, else the declared config. Whether to
    /// decrypt always follows the declared config.
    fn prior(&self) -> ContextConfig {
        let mut prior = match (&self.snapshot, &self.desired) {
            (Some(snapshot), _) => snapshot.clone(),
            (None, Some(config)) => mapper::normalize(config).unwrap_or_else(|_| config.clone()),
            (None, None) => ContextConfig {
                name: self.identity.clone().unwrap_or_default(),
                decrypt_spec: false,
                ..Default::default()
            },
        };
        if let Some(config) = &self.desired {
            prior.decrypt_spec = config.decrypt_spec;
        }
        prior
    }

    fn read(&self, prior: &ContextConfig) -> Result<Option<ContextConfig>> {
        let Some(name) = &self.identity else {
            return Ok(None);
        };
        let decrypt = mapper::read_decrypted(prior);
        log::debug!("reading context {name} (decrypt: {decrypt})");

        match found(self.client.get_context(name, decrypt))? {
            Some(remote) => Ok(Some(mapper::from_api(&remote, prior)?)),
            None => Ok(None),
        }
    }

    fn create(&self, config: &ContextConfig) -> Result<Context> {
        let payload = mapper::to_api(config)?;
        self.client
            .create_context(&payload)
            .with_context(|| format!("Failed to create context {}", config.name))
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.client
            .delete_context(name)
            .with_context(|| format!("Failed to delete context {name}"))
    }
}

impl Resource for ContextResource {
    fn id(&self) -> String {
        self.label.clone()
    }

    fn description(&self) -> String {
        match &self.desired {
            Some(config) => format!("Context {}", config.name),
            None => format!("Remove context {}", self.identity.as_deref().unwrap_or("?")),
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
        Ok(match self.read(&self.prior())? {
            Some(current) => rendered(&mapper::mask_sensitive(&current)),
            None => ResourceState::Absent,
        })
    }

    fn desired_state(&self) -> ResourceState {
        let Some(config) = &self.desired else {
            return ResourceState::Absent;
        };
        match mapper::normalize(config) {
            Ok(normalized) => rendered(&mapper::mask_sensitive(&normalized)),
            Err(e) => {
                log::warn!("{e:#}");
                ResourceState::Unknown
            }
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(ApplyResult::Skipped {
                reason: "Dry run".to_string(),
            });
        }

        let prior = self.prior();
        let current = self.read(&prior)?;

        let Some(config) = &self.desired else {
            if let Some(current) = current {
                self.delete(&current.name)?;
            }
            ctx.recorder.forget(RESOURCE_TYPE, &self.label);
            return Ok(ApplyResult::Removed);
        };

        let masked = mapper::mask_sensitive(&mapper::normalize(config)?);
        let snapshot = Some(render(&masked)?);

        let result = match current {
            None => {
                self.create(config)?;
                ApplyResult::Created
            }
            Some(current) if mapper::mask_sensitive(&current) == masked => ApplyResult::NoChange,
            Some(current)
                if current.name != config.name
                    || current.spec.detect_kind() != config.spec.detect_kind() =>
            {
                self.delete(&current.name)?;
                ctx.recorder.forget(RESOURCE_TYPE, &self.label);
                self.create(config)?;
                ApplyResult::Replaced
            }
            Some(_) => {
                self.client
                    .update_context(&mapper::to_api(config)?)
                    .with_context(|| format!("Failed to update context {}", config.name))?;
                ApplyResult::Modified
            }
        };

        ctx.recorder
            .record(RESOURCE_TYPE, &self.label, &config.name, snapshot);
        Ok(result)
    }
}

/// Read a context by name and render it the way `show` prints it
pub fn fetch(client: &Client, name: &str, decrypt: bool) -> Result<ContextConfig> {
    let remote = client.get_context(name, decrypt)?;
    let prior = ContextConfig {
        name: name.to_string(),
        decrypt_spec: decrypt,
        ..Default::default()
    };
    let config = mapper::from_api(&remote, &prior)?;
    Ok(if decrypt { config } else { mapper::mask_sensitive(&config) })
}
