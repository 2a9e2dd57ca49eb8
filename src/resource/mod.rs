//! Resources for remote Codefresh objects
//!
//! Every managed object is modeled as a Resource with:
//! - State detection (the remote object read back into manifest shape)
//! - Desired state (the declared config, normalized through the API mapping)
//! - Apply function (create, update, replace or delete through the client)
//!
//! A resource whose `desired` config is `None` is a removal: the object is
//! still recorded in state but no longer declared.

use anyhow::Result;
use declarative::ResourceState;
use serde::Serialize;

use crate::mapping::render;

pub mod context;
pub mod permission;
pub mod pipeline;
pub mod project;

pub use context::ContextResource;
pub use permission::PermissionResource;
pub use pipeline::PipelineResource;
pub use project::ProjectResource;

pub use declarative::{ApplyContext, ApplyResult, Resource};

/// Turn a 404 into `None`
pub(crate) fn found<T>(result: cfclient::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Present with the canonical rendering of `config`
pub(crate) fn rendered<T: Serialize>(config: &T) -> ResourceState {
    match render(config) {
        Ok(details) => ResourceState::present(details),
        Err(e) => {
            log::warn!("{e:#}");
            ResourceState::Unknown
        }
    }
}
