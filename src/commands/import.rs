//! `import` - bind an existing remote object to a manifest label

use anyhow::{Context as _, Result, bail};
use cfclient::Client;

use crate::Context;
use crate::cli::ResourceKind;
use crate::commands::show::fetch;
use crate::config::load_manifest;
use crate::mapping::{context as mapper, render};
use crate::resource::context as context_resource;
use crate::schema::{ContextConfig, ContextKind, Manifest};
use crate::state::{SyncState, address};
use crate::ui;
use declarative::StateRecorder;

/// Split `type.label`
pub fn parse_address(value: &str) -> Result<(ResourceKind, String)> {
    let Some((kind, label)) = value.split_once('.') else {
        bail!("Expected <type>.<label>, got {value:?}");
    };
    let Some(kind) = ResourceKind::parse(kind) else {
        bail!("Unknown resource type {kind:?} (expected project, pipeline, context or permission)");
    };
    if label.is_empty() {
        bail!("Missing label in {value:?}");
    }
    Ok((kind, label.to_string()))
}

/// Verify the object exists and record it
///
/// `manifest`, when loaded, decides how a context is read.
pub fn import(
    client: &Client,
    state: &mut SyncState,
    kind: ResourceKind,
    label: &str,
    identity: &str,
    manifest: Option<&Manifest>,
) -> Result<()> {
    let snapshot = match kind {
        ResourceKind::Context => {
            let declared = manifest.and_then(|m| m.contexts.get(label));
            context_snapshot(client, identity, declared)
                .with_context(|| format!("Failed to read context {identity}"))?
        }
        ResourceKind::Project => {
            render(&fetch(client, kind, identity, label, false)?.projects[label])?
        }
        ResourceKind::Pipeline => {
            render(&fetch(client, kind, identity, label, false)?.pipelines[label])?
        }
        ResourceKind::Permission => {
            render(&fetch(client, kind, identity, label, false)?.permissions[label])?
        }
    };
    state.record(kind.as_str(), label, identity, Some(snapshot));
    Ok(())
}

/// Masked snapshot of a context, read the way it is declared
///
/// An encrypted context declared without `decrypt_spec` only reads back
/// masked values, so the declared config is recorded in their place.
fn context_snapshot(
    client: &Client,
    identity: &str,
    declared: Option<&ContextConfig>,
) -> Result<String> {
    let decrypt = declared.is_some_and(|c| c.decrypt_spec);
    let fetched = context_resource::fetch(client, identity, decrypt)?;

    let config = match declared {
        Some(config)
            if !config.decrypt_spec
                && config.spec.detect_kind().is_some_and(ContextKind::is_encrypted) =>
        {
            mapper::normalize(config)?
        }
        _ => fetched,
    };
    render(&mapper::mask_sensitive(&config))
}

pub fn run(ctx: &Context, target: &str, identity: &str) -> Result<()> {
    let (kind, label) = parse_address(target)?;

    let mut state = SyncState::load(&ctx.settings.state_path)?;
    if let Some(existing) = state.identity(kind.as_str(), &label) {
        bail!("{target} is already bound to {existing}");
    }

    let manifest = match load_manifest(&ctx.settings.manifest_path) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            log::debug!("not checking manifest: {e:#}");
            None
        }
    };
    if let Some(manifest) = &manifest
        && !manifest.declares(kind.as_str(), &label)
    {
        ui::warn(&format!(
            "{target} is not declared in the manifest; the next apply will delete it"
        ));
    }

    let client = Client::new(ctx.settings.client_config()?);
    import(&client, &mut state, kind, &label, identity, manifest.as_ref())?;
    state.touch(&ctx.settings.state_path)?;

    ui::success(&format!("Imported {} as {identity}", address(kind.as_str(), &label)));
    Ok(())
}
