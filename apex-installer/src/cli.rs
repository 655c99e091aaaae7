//! CLI argument parsing for Apex.
//!
//! `install` is the default when no subcommand is given.

use apex_workflow::PostInstallChoice;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "apex")]
#[command(about = "🏔️ Apex - Arch Linux installer for the live medium")]
#[command(long_about = "🏔️ Apex - Arch Linux installer for the live medium\n\n\
    Partitions a disk, extracts the live root image (airootfs.sfs) onto it and\n\
    installs GRUB. Run without arguments for the interactive installer.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// TOML config file (default: /etc/apex-installer/config.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every privileged command instead of running it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log file (default: /var/log/apex-installer/install.log)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn command_or_default(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Install(InstallArgs::default()))
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 💾 Install Arch Linux onto a disk (erases it)
    Install(InstallArgs),

    /// 📋 Print the resolved command sequence without running anything
    Plan {
        /// Target disk device (e.g., /dev/sda)
        #[arg(long)]
        disk: String,

        /// SquashFS image; left as a placeholder when omitted
        #[arg(long)]
        image: Option<String>,
    },

    /// 🔍 Search the default locations for airootfs.sfs
    Locate {
        /// Read the authentication secret from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// 🔍 Run preflight checks (binaries, target disk, /mnt)
    Preflight {
        /// Target disk to check as well
        #[arg(long)]
        disk: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallArgs {
    /// Target disk device (e.g., /dev/sda); prompted for when omitted
    #[arg(long)]
    pub disk: Option<String>,

    /// Explicit SquashFS image path
    #[arg(long, conflicts_with = "search_defaults")]
    pub image: Option<String>,

    /// Use the first airootfs.sfs found in the default locations
    #[arg(long)]
    pub search_defaults: bool,

    /// Confirm the destructive operation without the typed prompt
    #[arg(long)]
    pub yes_i_know: bool,

    /// Read the authentication secret from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,

    /// Skip preflight checks
    #[arg(long)]
    pub skip_preflight: bool,

    /// Action after a successful install; prompted for when omitted
    #[arg(long, value_enum)]
    pub after: Option<AfterAction>,
}

impl InstallArgs {
    /// Every input is on the command line, so no prompt is needed.
    pub fn is_scripted(&self) -> bool {
        self.password_stdin
            && self.disk.is_some()
            && (self.image.is_some() || self.search_defaults)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AfterAction {
    Chroot,
    Reboot,
    Exit,
}

impl From<AfterAction> for PostInstallChoice {
    fn from(action: AfterAction) -> Self {
        match action {
            AfterAction::Chroot => PostInstallChoice::Chroot,
            AfterAction::Reboot => PostInstallChoice::Reboot,
            AfterAction::Exit => PostInstallChoice::Exit,
        }
    }
}
