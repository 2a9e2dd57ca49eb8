//! `show` - print one remote object as manifest TOML

use anyhow::{Context as _, Result};
use cfclient::Client;

use crate::Context;
use crate::cli::ResourceKind;
use crate::mapping::{permission, pipeline, project};
use crate::resource::context;
use crate::schema::Manifest;

/// Read one remote object into a single-entry manifest keyed by `label`
pub fn fetch(
    client: &Client,
    kind: ResourceKind,
    identity: &str,
    label: &str,
    decrypt: bool,
) -> Result<Manifest> {
    let mut manifest = Manifest::default();
    let label = label.to_string();
    let what = || format!("Failed to read {} {identity}", kind.as_str());

    match kind {
        ResourceKind::Project => {
            let remote = client.get_project(identity).with_context(what)?;
            manifest.projects.insert(label, project::from_api(&remote));
        }
        ResourceKind::Pipeline => {
            let remote = client.get_pipeline(identity).with_context(what)?;
            manifest.pipelines.insert(label, pipeline::from_api(&remote));
        }
        ResourceKind::Context => {
            let config = context::fetch(client, identity, decrypt).with_context(what)?;
            manifest.contexts.insert(label, config);
        }
        ResourceKind::Permission => {
            let remote = client.get_permission(identity).with_context(what)?;
            manifest.permissions.insert(label, permission::from_api(&remote));
        }
    }
    Ok(manifest)
}

/// Label derived from an identity: the last path segment
pub fn default_label(identity: &str) -> String {
    identity
        .rsplit('/')
        .next()
        .unwrap_or(identity)
        .to_string()
}

pub fn run(ctx: &Context, kind: ResourceKind, identity: &str, decrypt: bool) -> Result<()> {
    let client = Client::new(ctx.settings.client_config()?);
    let manifest = fetch(&client, kind, identity, &default_label(identity), decrypt)?;

    let rendered = toml::to_string_pretty(&manifest).context("Failed to render TOML")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfclient::{ClientConfig, Method, MockTransport};

    fn client(mock: &MockTransport) -> Client {
        Client::with_transport(ClientConfig::new("http://mock", "t"), Box::new(mock.clone()))
    }

    #[test]
    fn test_fetch_pipeline_as_manifest() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Get,
            "/pipelines/5f1",
            200,
            r#"{"metadata":{"id":"5f1","name":"web/build","projectId":"p1"},"spec":{}}"#,
        );

        let manifest =
            fetch(&client(&mock), ResourceKind::Pipeline, "5f1", "build", false).unwrap();
        assert_eq!(manifest.pipelines["build"].name, "web/build");

        let rendered = toml::to_string_pretty(&manifest).unwrap();
        let back: Manifest = toml::from_str(&rendered).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn test_fetch_missing_reports_status() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "/abac/a1", 404, r#"{"message":"not found"}"#);

        let err = fetch(&client(&mock), ResourceKind::Permission, "a1", "a1", false).unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("Failed to read permission a1"));
        assert!(text.contains(r#"{"message":"not found"}"#));
    }

    #[test]
    fn test_default_label() {
        assert_eq!(default_label("web/build"), "build");
        assert_eq!(default_label("shared-config"), "shared-config");
    }
}
