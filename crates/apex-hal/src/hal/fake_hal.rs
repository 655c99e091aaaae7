//! Fake HAL implementation for testing.
//!
//! This implementation records all invocations without executing them,
//! allowing CI-safe testing without root privileges or real hardware.

use super::{ExecutionResult, PrivilegedOps};
use crate::{Credential, HalError, HalResult};
use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Invocation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Privileged {
        program: String,
        args: Vec<String>,
        timeout_secs: u64,
    },
    Interactive {
        program: String,
        args: Vec<String>,
    },
}

impl Operation {
    pub fn program(&self) -> &str {
        match self {
            Operation::Privileged { program, .. } | Operation::Interactive { program, .. } => {
                program
            }
        }
    }

    pub fn args(&self) -> &[String] {
        match self {
            Operation::Privileged { args, .. } | Operation::Interactive { args, .. } => args,
        }
    }
}

/// Scripted result for a matching invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeOutcome {
    Exit { code: i32, stderr: String },
    Signal(i32),
    Timeout,
    SpawnError(String),
}

#[derive(Debug, Clone)]
struct Rule {
    program: String,
    arg_contains: Option<String>,
    outcome: FakeOutcome,
}

impl Rule {
    fn matches(&self, program: &str, args: &[String]) -> bool {
        if self.program != program {
            return false;
        }
        match &self.arg_contains {
            Some(needle) => args.iter().any(|a| a.contains(needle.as_str())),
            None => true,
        }
    }
}

#[derive(Debug, Default)]
struct FakeHalState {
    operations: Vec<Operation>,
    stdin_payloads: Vec<Vec<u8>>,
    existing_files: HashSet<String>,
    rules: Vec<Rule>,
}

/// Fake HAL that records invocations and answers from a script.
///
/// Every command succeeds unless a rule says otherwise; `test -f <path>`
/// succeeds only for paths registered with [`FakeHal::add_file`].
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeHalState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Make `test -f <path>` succeed.
    pub fn add_file(&self, path: &str) {
        self.lock().existing_files.insert(path.to_string());
    }

    /// Script the outcome of `program` (optionally only when an argument
    /// contains `arg_contains`). Later rules win over earlier ones.
    pub fn set_outcome(&self, program: &str, arg_contains: Option<&str>, outcome: FakeOutcome) {
        self.lock().rules.push(Rule {
            program: program.to_string(),
            arg_contains: arg_contains.map(str::to_string),
            outcome,
        });
    }

    /// Shorthand for a non-zero exit with the given stderr.
    pub fn fail_command(&self, program: &str, arg_contains: Option<&str>, code: i32, stderr: &str) {
        self.set_outcome(
            program,
            arg_contains,
            FakeOutcome::Exit {
                code,
                stderr: stderr.to_string(),
            },
        );
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.lock().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.lock().operations.iter().any(check)
    }

    /// Everything written to the children's stdin, in invocation order.
    pub fn stdin_payloads(&self) -> Vec<Vec<u8>> {
        self.lock().stdin_payloads.clone()
    }

    /// Clear all recorded operations.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.operations.clear();
        state.stdin_payloads.clear();
    }

    fn respond(&self, program: &str, args: &[String]) -> HalResult<ExecutionResult> {
        let state = self.lock();
        let scripted = state
            .rules
            .iter()
            .rev()
            .find(|rule| rule.matches(program, args))
            .map(|rule| rule.outcome.clone());

        let outcome = match scripted {
            Some(outcome) => outcome,
            None if program == "test" && args.first().map(String::as_str) == Some("-f") => {
                let exists = args
                    .get(1)
                    .is_some_and(|p| state.existing_files.contains(p));
                FakeOutcome::Exit {
                    code: if exists { 0 } else { 1 },
                    stderr: String::new(),
                }
            }
            None => FakeOutcome::Exit {
                code: 0,
                stderr: String::new(),
            },
        };

        match outcome {
            FakeOutcome::Exit { code, stderr } => Ok(ExecutionResult::exited(code, stderr)),
            FakeOutcome::Signal(sig) => Ok(ExecutionResult {
                signal: Some(sig),
                ..ExecutionResult::default()
            }),
            FakeOutcome::Timeout => Ok(ExecutionResult {
                timed_out: true,
                ..ExecutionResult::default()
            }),
            FakeOutcome::SpawnError(msg) => Err(HalError::Spawn {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, msg),
            }),
        }
    }
}

impl PrivilegedOps for FakeHal {
    fn run_privileged(
        &self,
        program: &str,
        args: &[String],
        credential: &Credential,
        timeout: Duration,
    ) -> HalResult<ExecutionResult> {
        log::info!("FAKE HAL: {} {}", program, args.join(" "));
        {
            let mut state = self.lock();
            state.operations.push(Operation::Privileged {
                program: program.to_string(),
                args: args.to_vec(),
                timeout_secs: timeout.as_secs(),
            });
            state
                .stdin_payloads
                .push(credential.stdin_payload().to_vec());
        }
        self.respond(program, args)
    }

    fn run_interactive(
        &self,
        program: &str,
        args: &[String],
        credential: &Credential,
    ) -> HalResult<ExecutionResult> {
        log::info!("FAKE HAL: interactive {} {}", program, args.join(" "));
        {
            let mut state = self.lock();
            state.operations.push(Operation::Interactive {
                program: program.to_string(),
                args: args.to_vec(),
            });
            state
                .stdin_payloads
                .push(credential.stdin_payload().to_vec());
        }
        self.respond(program, args)
    }
}
