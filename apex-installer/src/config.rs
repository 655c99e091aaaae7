//! Optional TOML configuration.

use anyhow::{Context, Result};
use apex_hal::Elevation;
use apex_workflow::DEFAULT_SEARCH_PATHS;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/apex-installer/config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Elevation helper (`sudo`, `doas`, ...).
    pub elevate_program: String,
    /// Arguments placed before the command; must make the helper read the
    /// secret from stdin.
    pub elevate_args: Vec<String>,
    /// Arguments that make the helper cache the secret read from stdin before
    /// a terminal-attached step; empty skips priming. Required unless the
    /// helper is sudo.
    pub elevate_validate_args: Option<Vec<String>>,
    /// Arguments for terminal-attached steps that must not prompt. Required
    /// unless the helper is sudo.
    pub elevate_interactive_args: Option<Vec<String>>,
    /// Image locations probed in order.
    pub search_paths: Vec<String>,
    pub probe_timeout_secs: u64,
    /// Replaces every per-step timeout when set.
    pub step_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        let elevation = Elevation::default();
        Self {
            elevate_program: elevation.program,
            elevate_args: elevation.args,
            elevate_validate_args: None,
            elevate_interactive_args: None,
            search_paths: DEFAULT_SEARCH_PATHS.iter().map(|p| p.to_string()).collect(),
            probe_timeout_secs: 10,
            step_timeout_secs: None,
            log_file: None,
        }
    }
}

impl InstallerConfig {
    /// Load `path`, or the default location when it exists, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text).context("failed to parse config TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.elevate_program.trim().is_empty() {
            anyhow::bail!("elevate_program must not be empty");
        }
        if !self.is_sudo()
            && (self.elevate_validate_args.is_none() || self.elevate_interactive_args.is_none())
        {
            anyhow::bail!(
                "elevate_validate_args and elevate_interactive_args must be set for {}",
                self.elevate_program
            );
        }
        if self.search_paths.is_empty() {
            anyhow::bail!("search_paths must list at least one location");
        }
        if self.probe_timeout_secs == 0 {
            anyhow::bail!("probe_timeout_secs must be greater than zero");
        }
        if self.step_timeout_secs == Some(0) {
            anyhow::bail!("step_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    fn is_sudo(&self) -> bool {
        Path::new(self.elevate_program.trim())
            .file_name()
            .is_some_and(|name| name == "sudo")
    }

    pub fn elevation(&self) -> Elevation {
        let defaults = Elevation::default();
        Elevation {
            program: self.elevate_program.clone(),
            args: self.elevate_args.clone(),
            validate_args: self
                .elevate_validate_args
                .clone()
                .unwrap_or(defaults.validate_args),
            interactive_args: self
                .elevate_interactive_args
                .clone()
                .unwrap_or(defaults.interactive_args),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }
}
