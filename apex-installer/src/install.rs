//! `apex install`: collect inputs, run the pipeline on a worker thread and
//! offer the post-install menu.

use crate::cli::InstallArgs;
use crate::config::InstallerConfig;
use crate::ui::{self, confirm, prompt, style::emoji};
use anyhow::{anyhow, Context, Result};
use apex_error::{InstallError, InstallResult};
use apex_hal::{Credential, PrivilegedOps};
use apex_workflow::preflight::{self, PreflightConfig};
use apex_workflow::{
    build_plan, run_post_install, CancelFlag, CredentialHolder, EventSink, ImageLocator,
    ImageSource, InstallEvent, Pipeline, PostInstallChoice, SessionConfig,
};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub fn run<H: PrivilegedOps>(
    hal: &H,
    config: &InstallerConfig,
    args: &InstallArgs,
    dry_run: bool,
) -> Result<()> {
    let interactive = !args.is_scripted();
    if interactive {
        ui::ensure_interactive_terminal()?;
    }
    let cancel = CancelFlag::new();
    ui::cancel::install_ctrlc_handler(cancel.clone())?;

    let mut holder = CredentialHolder::new();
    if args.password_stdin {
        prompt::read_secret_line(io::stdin().lock(), &mut holder)?;
    } else {
        prompt::prompt_secret(&mut holder)?;
    }
    let credential = holder.get()?;

    let drive = match args.disk.as_deref() {
        Some(disk) => {
            ui::validation::validate_disk_path(disk).map_err(|e| anyhow!(e))?;
            disk.trim().to_string()
        }
        None => prompt::prompt_drive()?,
    };

    let source = image_source(args)?;
    let image = locate_image(hal, credential, config, &source, interactive)?;
    let session = SessionConfig::new(credential.clone(), &drive, &image)?;

    if args.skip_preflight || dry_run {
        log::warn!("Skipping preflight checks");
    } else {
        let cfg = PreflightConfig::for_install(
            Some(PathBuf::from(session.drive())),
            &config.elevate_program,
        );
        preflight::run(&cfg).context("Preflight checks failed")?;
    }

    println!("{}", build_plan(session.drive(), session.image_path()));
    let question = format!("Erase {} and install?", session.drive());
    let confirm_erase = |_prompt: &str| -> Result<bool> {
        if dry_run || args.yes_i_know {
            return Ok(true);
        }
        if !interactive {
            return Err(anyhow::Error::new(InstallError::MissingConfirmation(
                session.drive().to_string(),
            ))
            .context("pass --yes-i-know to confirm"));
        }
        confirm::confirm_device_erase(session.drive())
    };
    let renderer = ui::progress::Renderer::new(interactive);
    let installed = confirm::confirm_and_run_with(&question, confirm_erase, || {
        run_pipeline_with(hal, &session, cancel, config.step_timeout(), |event| {
            renderer.render(event)
        })?;
        Ok(())
    })?;
    if !installed {
        println!("{} Aborted; nothing was changed.", emoji::CANCEL);
        return Ok(());
    }

    let choice = match args.after {
        Some(action) => PostInstallChoice::from(action),
        None if interactive => prompt::prompt_post_install()?,
        None => PostInstallChoice::Exit,
    };
    run_post_install(hal, session.credential(), choice, &EventSink::log_only())?;
    println!("{} Done.", emoji::PARTY);
    Ok(())
}

fn image_source(args: &InstallArgs) -> Result<ImageSource> {
    if let Some(ref image) = args.image {
        return Ok(ImageSource::Explicit(image.trim().to_string()));
    }
    if args.search_defaults || prompt::prompt_search_defaults()? {
        return Ok(ImageSource::SearchDefaults);
    }
    Ok(ImageSource::Explicit(prompt::prompt_image_path()?))
}

fn locate_image<H: PrivilegedOps>(
    hal: &H,
    credential: &Credential,
    config: &InstallerConfig,
    source: &ImageSource,
    interactive: bool,
) -> Result<String> {
    let (tx, rx) = mpsc::channel();
    let located = ImageLocator::new(hal, credential)
        .with_candidates(config.search_paths.clone())
        .with_probe_timeout(config.probe_timeout())
        .with_events(EventSink::new(tx))
        .locate(source);
    let renderer = ui::progress::Renderer::new(false);
    for event in rx.try_iter() {
        renderer.render(&event);
    }

    match located {
        Ok(path) => Ok(path),
        // A typo in a hand-entered path gets another chance.
        Err(err @ InstallError::InvalidImagePath(_)) if interactive => {
            eprintln!("{} {}", emoji::ERROR, err);
            let retry = ImageSource::Explicit(prompt::prompt_image_path()?);
            locate_image(hal, credential, config, &retry, interactive)
        }
        Err(err) => Err(err.into()),
    }
}

/// Run the install steps on a worker thread, handing every event to
/// `on_event` on the calling thread as it arrives.
///
/// A panic on the worker is re-raised on the caller.
pub fn run_pipeline_with<H, F>(
    hal: &H,
    session: &SessionConfig,
    cancel: CancelFlag,
    step_timeout: Option<Duration>,
    mut on_event: F,
) -> InstallResult<()>
where
    H: PrivilegedOps + ?Sized,
    F: FnMut(&InstallEvent),
{
    let (tx, rx) = mpsc::channel();
    thread::scope(|scope| {
        let worker = scope.spawn(move || {
            Pipeline::new(hal, session)
                .with_events(EventSink::new(tx))
                .with_cancel_flag(cancel)
                .with_timeout_override(step_timeout)
                .run()
        });
        // Ends once the worker drops its sender.
        for event in rx {
            on_event(&event);
        }
        worker
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
    })
}
