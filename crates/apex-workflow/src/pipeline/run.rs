use super::progress::Progress;
use super::steps::{install_steps, Step};
use super::template::render_args;
use crate::cancel::CancelFlag;
use crate::events::{EventSink, InstallEvent};
use crate::session::SessionConfig;
use apex_error::{describe_exit, InstallError, InstallResult};
use apex_hal::{HalError, PrivilegedOps};
use std::time::Duration;

/// Lifecycle of a [`Pipeline`]. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Idle,
    Running { step_index: usize },
    Completed,
    Failed { step_index: usize, error: InstallError },
}

impl PipelineStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStatus::Completed | PipelineStatus::Failed { .. }
        )
    }
}

/// Drives the install steps for one session. Runs at most once.
pub struct Pipeline<'a, H: PrivilegedOps + ?Sized> {
    hal: &'a H,
    session: &'a SessionConfig,
    steps: &'a [Step],
    events: EventSink,
    cancel: CancelFlag,
    timeout_override: Option<Duration>,
    status: PipelineStatus,
    step_index: usize,
    progress: Progress,
}

impl<'a, H: PrivilegedOps + ?Sized> Pipeline<'a, H> {
    pub fn new(hal: &'a H, session: &'a SessionConfig) -> Self {
        Self {
            hal,
            session,
            steps: install_steps(),
            events: EventSink::log_only(),
            cancel: CancelFlag::new(),
            timeout_override: None,
            status: PipelineStatus::Idle,
            step_index: 0,
            progress: Progress::default(),
        }
    }

    pub fn with_steps(mut self, steps: &'a [Step]) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Use `timeout` for every step instead of the per-step defaults.
    pub fn with_timeout_override(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_override = timeout;
        self
    }

    pub fn status(&self) -> &PipelineStatus {
        &self.status
    }

    /// Number of steps completed successfully.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn progress(&self) -> u8 {
        self.progress.percent()
    }

    /// Execute every remaining step in order, stopping at the first failure.
    ///
    /// Calling `run` again after a terminal state replays the outcome
    /// without touching the target.
    pub fn run(&mut self) -> InstallResult<()> {
        match &self.status {
            PipelineStatus::Idle => {}
            PipelineStatus::Completed => return Ok(()),
            PipelineStatus::Failed { error, .. } => return Err(error.clone()),
            PipelineStatus::Running { step_index } => {
                return Err(InstallError::InvalidInput(format!(
                    "pipeline already running at step {}",
                    step_index
                )))
            }
        }

        log::info!(
            "Installing to {} from {} ({} steps)",
            self.session.drive(),
            self.session.image_path(),
            self.steps.len()
        );
        self.events
            .send(InstallEvent::Progress(self.progress.percent()));

        while self.step_index < self.steps.len() {
            let index = self.step_index;
            if self.cancel.is_requested() {
                self.events.log("Installation cancelled by operator.");
                return Err(self.fail(index, InstallError::Cancelled));
            }

            let step = self.steps[index];
            self.status = PipelineStatus::Running { step_index: index };
            self.events.send(InstallEvent::StepStarted {
                index,
                name: step.name,
            });

            if let Err(err) = self.execute(&step) {
                return Err(self.fail(index, err));
            }

            self.events.log("Command completed successfully.");
            if let Some(pct) = step.milestone {
                if self.progress.advance_to(pct) {
                    self.events.send(InstallEvent::Progress(pct));
                }
            }
            self.step_index += 1;
        }

        self.status = PipelineStatus::Completed;
        self.events.send(InstallEvent::Completed);
        Ok(())
    }

    fn execute(&self, step: &Step) -> InstallResult<()> {
        let args = render_args(step.args, self.session.drive(), self.session.image_path());
        let timeout = self.timeout_override.unwrap_or(step.timeout);
        self.events
            .log(format!("Executing: {} {}", step.program, args.join(" ")));

        let result = self
            .hal
            .run_privileged(step.program, &args, self.session.credential(), timeout)
            .and_then(|res| res.into_checked(step.program, timeout));

        match result {
            Ok(_) => Ok(()),
            Err(HalError::CommandFailed {
                program,
                code,
                signal,
                stderr,
            }) => {
                match code {
                    Some(code) => self
                        .events
                        .log(format!("Error: Command failed with exit code {}", code)),
                    None => self.events.log(format!(
                        "Error: Command failed ({})",
                        describe_exit(code, signal)
                    )),
                }
                if !stderr.is_empty() {
                    self.events.log(format!("Error output: {}", stderr));
                }
                Err(InstallError::CommandFailed {
                    program,
                    exit_code: code,
                    signal,
                    stderr,
                })
            }
            Err(other) => {
                let err = InstallError::from(other);
                self.events.log(format!("Error: {}", err));
                Err(err)
            }
        }
    }

    fn fail(&mut self, step_index: usize, error: InstallError) -> InstallError {
        self.status = PipelineStatus::Failed {
            step_index,
            error: error.clone(),
        };
        self.events.send(InstallEvent::Failed {
            step_index,
            detail: error.to_string(),
        });
        error
    }
}
