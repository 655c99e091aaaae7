//! Linux HAL implementation spawning real elevated processes.

use super::{ExecutionResult, PrivilegedOps};
use crate::{Credential, HalError, HalResult};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::{self, Read, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::time::Duration;
use wait_timeout::ChildExt;

const VALIDATE_TIMEOUT: Duration = Duration::from_secs(30);
/// Time the helper gets to relay SIGTERM to its command before SIGKILL.
const TERM_GRACE: Duration = Duration::from_secs(5);
/// Bound on collecting output once the child is gone.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How commands are elevated.
///
/// Stdin-fed runs are `<program> <args...> <command...>`. Terminal-attached
/// runs first prime the helper with `<program> <validate_args...>` (secret on
/// stdin; skipped when empty), then run
/// `<program> <interactive_args...> <command...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elevation {
    pub program: String,
    pub args: Vec<String>,
    pub validate_args: Vec<String>,
    pub interactive_args: Vec<String>,
}

impl Default for Elevation {
    fn default() -> Self {
        Self {
            program: "sudo".to_string(),
            args: vec!["-S".to_string()],
            validate_args: vec!["-S".to_string(), "-v".to_string()],
            interactive_args: vec!["-n".to_string()],
        }
    }
}

impl Elevation {
    /// Full argv of an elevated invocation, without the secret.
    pub fn command_line(&self, program: &str, args: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + args.len() + 2);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv.push(program.to_string());
        argv.extend(args.iter().cloned());
        argv
    }

    fn interactive_command_line(&self, program: &str, args: &[String]) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.interactive_args.iter().cloned());
        argv.push(program.to_string());
        argv.extend(args.iter().cloned());
        argv
    }
}

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone, Default)]
pub struct LinuxHal {
    elevation: Elevation,
    dry_run: bool,
}

impl LinuxHal {
    pub fn new(elevation: Elevation) -> Self {
        Self {
            elevation,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn elevation(&self) -> &Elevation {
        &self.elevation
    }

    fn elevated(&self, program: &str, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.elevation.program);
        cmd.args(&self.elevation.args).arg(program).args(args);
        cmd
    }
}

fn map_spawn_err(program: &str, err: io::Error) -> HalError {
    HalError::Spawn {
        program: program.to_string(),
        source: err,
    }
}

fn status_parts(status: &ExitStatus) -> (Option<i32>, Option<i32>) {
    (status.code(), status.signal())
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

/// A descendant that escaped the process group may still hold the pipe open;
/// whatever arrived within the grace period is kept.
fn collect(rx: &mpsc::Receiver<Vec<u8>>) -> Vec<u8> {
    rx.recv_timeout(DRAIN_GRACE).unwrap_or_default()
}

/// Stop the child's whole process group. The helper relays SIGTERM to a
/// command running as another user, which this process may not signal.
fn terminate_group(label: &str, child: &mut Child) {
    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(pgid, Signal::SIGTERM) {
        log::warn!("SIGTERM to process group of {} failed: {}", label, e);
    }
    match child.wait_timeout(TERM_GRACE) {
        Ok(Some(_)) => {}
        _ => {
            log::warn!("{} ignored SIGTERM; sending SIGKILL", label);
            let _ = killpg(pgid, Signal::SIGKILL);
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Spawn `cmd` in its own process group, write `payload` to its stdin, close
/// stdin and wait at most `timeout` for it to exit.
///
/// The separate group keeps terminal signals (Ctrl+C) away from the child.
fn run_with_stdin(
    label: &str,
    cmd: &mut Command,
    payload: &[u8],
    timeout: Duration,
) -> HalResult<ExecutionResult> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);
    let mut child = cmd.spawn().map_err(|e| map_spawn_err(label, e))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    if let Some(mut stdin) = child.stdin.take() {
        // A child that never reads stdin may already be gone.
        if let Err(e) = stdin.write_all(payload) {
            if e.kind() != io::ErrorKind::BrokenPipe {
                log::warn!("Failed to write credential to {}: {}", label, e);
            }
        }
    }

    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            log::warn!("{} exceeded {}s; terminating it", label, timeout.as_secs());
            terminate_group(label, &mut child);
            return Ok(ExecutionResult {
                exit_code: None,
                signal: None,
                stdout: collect(&stdout),
                stderr: collect(&stderr),
                timed_out: true,
            });
        }
    };

    let (exit_code, signal) = status_parts(&status);
    Ok(ExecutionResult {
        exit_code,
        signal,
        stdout: collect(&stdout),
        stderr: collect(&stderr),
        timed_out: false,
    })
}

impl PrivilegedOps for LinuxHal {
    fn run_privileged(
        &self,
        program: &str,
        args: &[String],
        credential: &Credential,
        timeout: Duration,
    ) -> HalResult<ExecutionResult> {
        if self.dry_run {
            log::info!(
                "DRY RUN: {}",
                self.elevation.command_line(program, args).join(" ")
            );
            return Ok(ExecutionResult::exited(0, Vec::new()));
        }

        log::debug!(
            "spawning {} (timeout {}s)",
            self.elevation.command_line(program, args).join(" "),
            timeout.as_secs()
        );
        let mut cmd = self.elevated(program, args);
        run_with_stdin(program, &mut cmd, &credential.stdin_payload(), timeout)
    }

    fn run_interactive(
        &self,
        program: &str,
        args: &[String],
        credential: &Credential,
    ) -> HalResult<ExecutionResult> {
        let argv = self.elevation.interactive_command_line(program, args);
        if self.dry_run {
            log::info!("DRY RUN: {}", argv.join(" "));
            return Ok(ExecutionResult::exited(0, Vec::new()));
        }

        // Prime the helper's credential cache with the secret so the
        // interactive child can keep the terminal's stdin.
        if !self.elevation.validate_args.is_empty() {
            let mut validate = Command::new(&self.elevation.program);
            validate.args(&self.elevation.validate_args);
            let primed = run_with_stdin(
                &self.elevation.program,
                &mut validate,
                &credential.stdin_payload(),
                VALIDATE_TIMEOUT,
            )?;
            if !primed.is_success() {
                log::warn!(
                    "{} rejected the credential; not starting {}",
                    self.elevation.program,
                    program
                );
                return Ok(primed);
            }
        }

        log::debug!("spawning {} (interactive)", argv.join(" "));
        let status = Command::new(&self.elevation.program)
            .args(&self.elevation.interactive_args)
            .arg(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| map_spawn_err(program, e))?;
        let (exit_code, signal) = status_parts(&status);
        Ok(ExecutionResult {
            exit_code,
            signal,
            ..ExecutionResult::default()
        })
    }
}
