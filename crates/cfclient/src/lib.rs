//! # cfclient
//!
//! Minimal blocking client for the Codefresh REST API.
//!
//! The crate is split in two layers:
//! - [`Client::execute`] builds a request from [`RequestOptions`], attaches the
//!   raw API token, sends it through a [`transport::Transport`] and returns the
//!   buffered body of a 200 response. Anything else becomes an [`Error`].
//! - Typed endpoints for the domain objects: [`Project`], [`Pipeline`],
//!   [`Context`] and [`Permission`].
//!
//! ## Example
//!
//! ```no_run
//! use cfclient::{Client, ClientConfig};
//!
//! let client = Client::new(ClientConfig::new(cfclient::DEFAULT_API_URL, "token"));
//! let context = client.get_context("shared-config", false).unwrap();
//! println!("{} is a {} context", context.metadata.name, context.spec.context_type);
//! ```
//!
//! There are no retries and no caching: every call is one blocking round trip.

pub mod client;
pub mod context;
pub mod error;
pub mod permission;
pub mod pipeline;
pub mod project;
pub mod transport;
pub mod variables;

pub use client::{
    CONTENT_TYPE, Client, ClientConfig, DEFAULT_API_URL, RequestOptions, decode_json,
    encode_json, to_query_string,
};
pub use context::{Context, ContextMetadata, ContextSpec};
pub use error::{Error, ErrorCategory, Result};
pub use permission::Permission;
pub use pipeline::{Labels, Metadata, Pipeline, PipelineSpec, SpecTemplate, Trigger};
pub use project::Project;
pub use transport::{Method, MockTransport};
pub use variables::{Variable, variables_from_map, variables_to_map};
