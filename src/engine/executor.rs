//! Execution engine - cfsync-specific executor with UI integration

use anyhow::Result;
use colored::Colorize;
use declarative::{
    ApplyResult, AutoConfirm, ConfirmCallback, ExecuteOptions, ExecuteSummary, ExecutionPlan,
    ProgressCallback, ResourceDiff, StateRecorder,
};

use super::differ::display_diff;

/// Options for an apply run
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Verbose output
    pub verbose: bool,
}

/// Terminal progress: prints the plan, then one line per applied resource
pub struct TerminalProgress {
    verbose: bool,
}

impl ProgressCallback for TerminalProgress {
    fn on_plan(&mut self, diffs: &[ResourceDiff]) {
        display_diff(diffs, self.verbose);
    }

    fn on_batch_start(&mut self, count: usize) {
        println!();
        println!("  {} Applying {} resources...", "→".cyan(), count);
    }

    fn on_resource_start(&mut self, id: &str, description: &str) {
        log::info!("applying {id}: {description}");
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        let symbol = match result {
            ApplyResult::NoChange => "○".dimmed(),
            ApplyResult::Created
            | ApplyResult::Modified
            | ApplyResult::Replaced
            | ApplyResult::Removed => "✓".green(),
            ApplyResult::Failed { .. } => "✗".red(),
            ApplyResult::Skipped { .. } => "⊘".yellow(),
        };
        let detail = match result {
            ApplyResult::Created => "created".to_string(),
            ApplyResult::Modified => "updated".to_string(),
            ApplyResult::Replaced => "replaced".to_string(),
            ApplyResult::Removed => "removed".to_string(),
            ApplyResult::NoChange => "unchanged".to_string(),
            ApplyResult::Failed { error } => error.clone(),
            ApplyResult::Skipped { reason } => format!("skipped: {reason}"),
        };
        println!("    {} {} {}", symbol, id, detail.dimmed());
    }

    fn on_batch_complete(&mut self) {}
}

/// Interactive confirmation through dialoguer
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}

/// Show the plan, confirm unless `yes`, and apply
pub fn apply(
    plan: ExecutionPlan,
    opts: &ApplyOptions,
    recorder: &mut dyn StateRecorder,
) -> Result<ExecuteSummary> {
    let mut progress = TerminalProgress {
        verbose: opts.verbose,
    };
    let execute_opts = ExecuteOptions {
        dry_run: opts.dry_run,
        verbose: opts.verbose,
    };

    let summary = if opts.yes {
        declarative::execute(plan, execute_opts, recorder, &mut progress, &mut AutoConfirm)?
    } else {
        declarative::execute(plan, execute_opts, recorder, &mut progress, &mut PromptConfirm)?
    };

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if summary.total_changes() > 0 || !summary.is_success() {
        print_summary(&summary);
    } else if summary.skipped > 0 {
        println!();
        println!("  {} Aborted", "✗".red());
    }

    Ok(summary)
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!(
            "  {} Configuration applied successfully!",
            "✓".green().bold()
        );
    } else {
        println!(
            "  {} Configuration applied with errors",
            "⚠".yellow().bold()
        );
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} resources modified", summary.modified);
    }
    if summary.replaced > 0 {
        println!("    • {} resources replaced", summary.replaced);
    }
    if summary.removed > 0 {
        println!("    • {} resources removed", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}
