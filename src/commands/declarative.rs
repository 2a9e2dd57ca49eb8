//! Declarative commands
//!
//! - `plan` - Show what apply would change
//! - `apply` - Make the remote objects match the manifest
//! - `validate` - Check the manifest without touching the network

use anyhow::{Result, bail};
use cfclient::Client;
use colored::Colorize;
use declarative::compute_diffs;
use std::sync::Arc;

use crate::Context;
use crate::config::load_manifest;
use crate::engine::{self, ApplyOptions, build_plan, differ::display_diff, stale_addresses};
use crate::schema::Manifest;
use crate::state::SyncState;
use crate::ui;
use declarative::StateRecorder;

/// Fail with every manifest problem listed
fn check_manifest(manifest: &Manifest) -> Result<()> {
    let problems = manifest.validate();
    if problems.is_empty() {
        return Ok(());
    }
    for (address, problem) in &problems {
        ui::error(&format!("{address}: {problem}"));
    }
    bail!("Manifest has {} problem(s)", problems.len())
}

fn client(ctx: &Context) -> Result<Arc<Client>> {
    Ok(Arc::new(Client::new(ctx.settings.client_config()?)))
}

pub fn plan(ctx: &Context, target: Option<&str>) -> Result<()> {
    let manifest = load_manifest(&ctx.settings.manifest_path)?;
    check_manifest(&manifest)?;
    let state = SyncState::load(&ctx.settings.state_path)?;

    let plan = build_plan(&manifest, &state, &client(ctx)?).filter_by_target(target);
    plan.validate_all()?;
    log::info!("planning {} resources", plan.total_resources());

    let diffs = compute_diffs(&plan.resources)?;
    display_diff(&diffs, ctx.verbose > 0);

    if !diffs.is_empty() && !ctx.quiet {
        println!();
        ui::dim("Run `cfsync apply` to make these changes.");
    }
    Ok(())
}

pub fn apply(ctx: &Context, target: Option<&str>, dry_run: bool, yes: bool) -> Result<()> {
    let manifest = load_manifest(&ctx.settings.manifest_path)?;
    check_manifest(&manifest)?;
    let mut state = SyncState::load(&ctx.settings.state_path)?;

    let plan = build_plan(&manifest, &state, &client(ctx)?).filter_by_target(target);
    let stale = stale_addresses(&plan);

    let opts = ApplyOptions {
        dry_run,
        yes,
        verbose: ctx.verbose > 0,
    };
    let summary = engine::apply(plan, &opts, &mut state)?;

    if dry_run {
        return Ok(());
    }

    if summary.is_success() && summary.skipped == 0 {
        for (resource_type, label) in &stale {
            state.forget(resource_type, label);
        }
    }

    // Identities of objects created before a failure must survive it
    state.touch(&ctx.settings.state_path)?;

    if !summary.is_success() {
        bail!("{} resource(s) failed", summary.failed);
    }
    Ok(())
}

pub fn validate(ctx: &Context) -> Result<()> {
    let manifest = load_manifest(&ctx.settings.manifest_path)?;
    check_manifest(&manifest)?;

    ui::success(&format!(
        "{} is valid ({} objects)",
        ctx.settings.manifest_path.display(),
        manifest.len().to_string().bold()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PermissionConfig, ProjectConfig};

    #[test]
    fn test_check_manifest() {
        let mut manifest = Manifest::default();
        manifest.projects.insert(
            "web".into(),
            ProjectConfig {
                name: "web".into(),
                ..Default::default()
            },
        );
        assert!(check_manifest(&manifest).is_ok());

        manifest.permissions.insert(
            "bad".into(),
            PermissionConfig {
                team: "t1".into(),
                resource: "project".into(),
                action: "run".into(),
                ..Default::default()
            },
        );
        let err = check_manifest(&manifest).unwrap_err();
        assert!(err.to_string().contains("1 problem"));
    }
}
