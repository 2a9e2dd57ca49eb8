use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cfsync")]
#[command(version)]
#[command(
    about = "Declarative sync of Codefresh projects, pipelines, contexts and permissions",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest describing the desired objects
    #[arg(long, global = true, default_value = "cfsync.toml")]
    pub manifest: PathBuf,

    /// State file mapping manifest labels to remote identities
    #[arg(long, global = true, default_value = ".cfsync/state.toml")]
    pub state: PathBuf,

    /// Codefresh API base URL
    #[arg(
        long,
        global = true,
        env = "CODEFRESH_API_URL",
        default_value = cfclient::DEFAULT_API_URL
    )]
    pub api_url: String,

    /// API token
    #[arg(long, global = true, env = "CODEFRESH_API_KEY", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Make the remote objects match the manifest
    Apply(ApplyArgs),

    /// Check the manifest without contacting the API
    Validate,

    /// Print a remote object as manifest TOML
    Show(ShowArgs),

    /// Bind an existing remote object to a manifest label
    Import(ImportArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct PlanArgs {
    /// Only plan matching resources: "type" or "type.label"
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only apply matching resources: "type" or "type.label"
    #[arg(short, long)]
    pub target: Option<String>,

    /// Show what would change without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Object type
    #[arg(value_enum)]
    pub resource_type: ResourceKind,

    /// Context name, or the ID of a project, pipeline or permission
    pub identity: String,

    /// Read encrypted contexts in cleartext
    #[arg(long)]
    pub decrypt: bool,
}

#[derive(Parser)]
pub struct ImportArgs {
    /// Manifest address, e.g. "pipeline.build"
    pub address: String,

    /// Context name, or the ID of a project, pipeline or permission
    pub identity: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    Project,
    Pipeline,
    Context,
    Permission,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Pipeline => "pipeline",
            Self::Context => "context",
            Self::Permission => "permission",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, false).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::try_parse_from([
            "cfsync",
            "apply",
            "--target",
            "pipeline.build",
            "--yes",
            "--token",
            "abc",
        ])
        .unwrap();

        assert_eq!(cli.token.as_deref(), Some("abc"));
        assert_eq!(cli.manifest, PathBuf::from("cfsync.toml"));
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.target.as_deref(), Some("pipeline.build"));
                assert!(args.yes);
                assert!(!args.dry_run);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_resource_kind_parse() {
        assert_eq!(ResourceKind::parse("context"), Some(ResourceKind::Context));
        assert_eq!(ResourceKind::parse("cluster"), None);
        assert_eq!(ResourceKind::Permission.as_str(), "permission");
    }
}
