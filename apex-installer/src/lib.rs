//! Apex terminal front end.

use anyhow::Context;
use apex_hal::LinuxHal;
use apex_workflow::pipeline::IMAGE_TOKEN;
use apex_workflow::preflight::{self, PreflightConfig};
use apex_workflow::{build_plan, CredentialHolder, EventSink, ImageLocator, ImageSource};
use clap::Parser;
use std::io;

pub mod cli;
pub mod config;
pub mod install;
pub mod logging;
pub mod ui;

use ui::style::{self, emoji};

pub fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = config::InstallerConfig::load(cli.config.as_deref())?;
    logging::init_with(cli.log_file.clone().or_else(|| config.log_file.clone()));

    let hal = LinuxHal::new(config.elevation()).with_dry_run(cli.dry_run);
    if cli.dry_run {
        log::info!("Dry run: privileged commands are logged, not executed");
    }

    match cli.command_or_default() {
        cli::Command::Install(args) => {
            log::info!("{}", style::with(emoji::DISK, "Starting installation"));
            install::run(&hal, &config, &args, cli.dry_run)?;
        }
        cli::Command::Plan { disk, image } => {
            let drive = apex_workflow::session::validate_drive(&disk)?;
            let image = match image {
                Some(path) => apex_workflow::session::validate_image_path(&path)?,
                None => IMAGE_TOKEN.to_string(),
            };
            print!("{}", build_plan(&drive, &image));
        }
        cli::Command::Locate { password_stdin } => {
            let mut holder = CredentialHolder::new();
            if password_stdin {
                ui::prompt::read_secret_line(io::stdin().lock(), &mut holder)?;
            } else {
                ui::ensure_interactive_terminal()?;
                ui::prompt::prompt_secret(&mut holder)?;
            }
            let path = ImageLocator::new(&hal, holder.get()?)
                .with_candidates(config.search_paths.clone())
                .with_probe_timeout(config.probe_timeout())
                .with_events(EventSink::log_only())
                .locate(&ImageSource::SearchDefaults)?;
            println!("{}", path);
        }
        cli::Command::Preflight { disk } => {
            log::info!("{}", style::with(emoji::SEARCH, "Running preflight checks..."));
            let cfg = PreflightConfig::for_install(disk, &config.elevate_program);
            preflight::run(&cfg).context("Preflight checks failed")?;
            println!("{}", style::with(emoji::SUCCESS, "Preflight checks passed"));
        }
    }
    Ok(())
}
