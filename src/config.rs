//! Runtime settings resolved from the command line and environment

use anyhow::{Context, Result, bail};
use cfclient::ClientConfig;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::schema::Manifest;

/// Paths and API access for one invocation
#[derive(Clone)]
pub struct Settings {
    pub manifest_path: PathBuf,
    pub state_path: PathBuf,
    pub api_url: String,
    token: Option<String>,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            manifest_path: expand_path(&cli.manifest),
            state_path: expand_path(&cli.state),
            api_url: cli.api_url.clone(),
            token: cli.token.clone().filter(|t| !t.trim().is_empty()),
        }
    }

    /// Client configuration; fails when no token was given
    pub fn client_config(&self) -> Result<ClientConfig> {
        let Some(token) = &self.token else {
            bail!("No API token: pass --token or set CODEFRESH_API_KEY");
        };
        Ok(ClientConfig::new(self.api_url.clone(), token.clone()))
    }
}

/// Expand a leading `~`
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read manifest {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid manifest {}", path.display()))
}
