use std::io;
use thiserror::Error;

pub type HalResult<T> = Result<T, HalError>;
pub type InstallResult<T> = Result<T, InstallError>;

/// Failures raised while launching or waiting on a privileged child process.
#[derive(Error, Debug)]
pub enum HalError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Command failed: {program} ({}): {stderr}", exit_label(.code, .signal))]
    CommandFailed {
        program: String,
        code: Option<i32>,
        signal: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out: {program} after {timeout_secs}s")]
    CommandTimeout { program: String, timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Error taxonomy of the installation workflow.
///
/// Every variant is terminal for the operation that raised it; nothing is
/// retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    #[error("Authentication secret is empty")]
    EmptyCredential,

    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to start {program}: {reason}")]
    SpawnError { program: String, reason: String },

    #[error("Invalid SquashFS file path: {0}")]
    InvalidImagePath(String),

    #[error("{program} failed ({}): {stderr}", exit_label(.exit_code, .signal))]
    CommandFailed {
        program: String,
        exit_code: Option<i32>,
        signal: Option<i32>,
        stderr: String,
    },

    #[error("{program} did not finish within {timeout_secs}s")]
    TimedOut { program: String, timeout_secs: u64 },

    #[error("SquashFS file not found in default locations ({})", .searched.join(", "))]
    NotFound { searched: Vec<String> },

    #[error("Installation cancelled")]
    Cancelled,

    #[error("Missing confirmation. This operation erases {0}!")]
    MissingConfirmation(String),
}

impl InstallError {
    /// Exit code reported by the failing child, when there was one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            InstallError::CommandFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

impl From<HalError> for InstallError {
    fn from(err: HalError) -> Self {
        match err {
            HalError::Spawn { program, source } => InstallError::SpawnError {
                program,
                reason: source.to_string(),
            },
            HalError::CommandFailed {
                program,
                code,
                signal,
                stderr,
            } => InstallError::CommandFailed {
                program,
                exit_code: code,
                signal,
                stderr,
            },
            HalError::CommandTimeout {
                program,
                timeout_secs,
            } => InstallError::TimedOut {
                program,
                timeout_secs,
            },
            HalError::Io(e) => InstallError::SpawnError {
                program: "<io>".to_string(),
                reason: e.to_string(),
            },
            HalError::Other(msg) => InstallError::SpawnError {
                program: "<unknown>".to_string(),
                reason: msg,
            },
        }
    }
}

/// Human-readable exit description: `exit=1` or `killed by SIGKILL`.
pub fn describe_exit(code: Option<i32>, signal: Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("exit={}", code),
        (None, Some(sig)) => match nix::sys::signal::Signal::try_from(sig) {
            Ok(name) => format!("killed by {}", name),
            Err(_) => format!("killed by signal {}", sig),
        },
        (None, None) => "abnormal termination".to_string(),
    }
}

fn exit_label(code: &Option<i32>, signal: &Option<i32>) -> String {
    describe_exit(*code, *signal)
}
