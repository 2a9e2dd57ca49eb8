//! Diff display - cfsync-specific UI

use colored::Colorize;
use declarative::{DiffSummary, ResourceDiff, group_by_type};
use similar::{ChangeTag, TextDiff};

/// Display a list of diffs in a user-friendly format
///
/// Additions and removals list the address only; modifications also print
/// the changed lines of the rendered configuration. With `verbose`, the full
/// rendering of additions is shown too.
pub fn display_diff(diffs: &[ResourceDiff], verbose: bool) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Configuration Diff".bold()
    );
    println!("│");

    for (resource_type, type_diffs) in group_by_type(diffs) {
        println!("│ {}", type_heading(&resource_type).bold());

        for diff in type_diffs {
            let (symbol, note) = if diff.is_addition() {
                ("+".green(), "(will create)")
            } else if diff.is_removal() {
                ("-".red(), "(will remove)")
            } else if diff.is_modification() {
                ("~".yellow(), "")
            } else {
                ("?".dimmed(), "(unknown state)")
            };

            println!(
                "│   {} {:<30} {} {}",
                symbol,
                diff.resource_id,
                diff.description.dimmed(),
                note.dimmed()
            );

            if diff.is_modification() {
                for (tag, line) in changed_lines(
                    diff.current.details().unwrap_or_default(),
                    diff.desired.details().unwrap_or_default(),
                ) {
                    match tag {
                        ChangeTag::Delete => println!("│       {}", format!("- {line}").red()),
                        ChangeTag::Insert => println!("│       {}", format!("+ {line}").green()),
                        ChangeTag::Equal => {}
                    }
                }
            } else if verbose && diff.is_addition() {
                for line in diff.desired.details().unwrap_or_default().lines() {
                    println!("│       {}", line.dimmed());
                }
            }
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to create, {} to change, {} to remove",
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

fn type_heading(resource_type: &str) -> &str {
    match resource_type {
        "project" => "Projects",
        "pipeline" => "Pipelines",
        "context" => "Contexts",
        "permission" => "Permissions",
        other => other,
    }
}

/// Inserted and deleted lines between two renderings
fn changed_lines(from: &str, to: &str) -> Vec<(ChangeTag, String)> {
    TextDiff::from_lines(from, to)
        .iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal)
        .map(|change| (change.tag(), change.value().trim_end().to_string()))
        .collect()
}
