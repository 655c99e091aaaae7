//! Privileged process execution.
//!
//! External commands that touch the target disk are "world-touching" and must
//! go through this trait so workflows can be tested without spawning real
//! processes.

use crate::{Credential, HalError, HalResult};
use std::time::Duration;

/// Outcome of a single privileged invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code; `None` when the child was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
}

impl ExecutionResult {
    pub fn exited(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(code),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Convert a non-successful result into the matching [`HalError`].
    pub fn into_checked(self, program: &str, timeout: Duration) -> HalResult<Self> {
        if self.timed_out {
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
        if !self.is_success() {
            return Err(HalError::CommandFailed {
                program: program.to_string(),
                code: self.exit_code,
                signal: self.signal,
                stderr: self.stderr_text(),
            });
        }
        Ok(self)
    }
}

/// Runner for commands that need elevated rights.
pub trait PrivilegedOps: Send + Sync {
    /// Run `program args...` elevated, feeding `credential` on stdin.
    ///
    /// Returns `Ok` for every child that was started, whatever its exit status;
    /// only a failure to spawn is an error.
    fn run_privileged(
        &self,
        program: &str,
        args: &[String],
        credential: &Credential,
        timeout: Duration,
    ) -> HalResult<ExecutionResult>;

    /// Run `program args...` elevated with the caller's terminal attached.
    ///
    /// No timeout applies; the call returns when the operator leaves the
    /// program.
    fn run_interactive(
        &self,
        program: &str,
        args: &[String],
        credential: &Credential,
    ) -> HalResult<ExecutionResult>;

    /// Like [`PrivilegedOps::run_privileged`] but a non-zero exit, a signal or
    /// a timeout becomes an error.
    fn run_privileged_checked(
        &self,
        program: &str,
        args: &[String],
        credential: &Credential,
        timeout: Duration,
    ) -> HalResult<ExecutionResult> {
        self.run_privileged(program, args, credential, timeout)?
            .into_checked(program, timeout)
    }

    /// Privileged `test -f <path>`.
    fn probe_file(
        &self,
        path: &str,
        credential: &Credential,
        timeout: Duration,
    ) -> HalResult<ExecutionResult> {
        let args = ["-f".to_string(), path.to_string()];
        self.run_privileged("test", &args, credential, timeout)
    }
}
