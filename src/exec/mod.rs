//! Fanning one command out over a set of targets
//!
//! An [`ExecutionPlan`] bundles the ordered targets, the command line and the
//! execution mode. The [`coordinator`] drives one [`invoker`] call per target and
//! always returns outcomes in target order, whichever mode was chosen.

use std::fmt;
use std::num::NonZeroUsize;

use thiserror::Error;

use crate::target::Target;

pub mod coordinator;
pub mod invoker;
pub mod outcome;

pub use coordinator::{OutcomeSink, run, run_with_sink};
pub use outcome::{Outcome, OutcomeKind, Summary};

/// Internal precondition violations, fatal before any target is touched
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanError {
    #[error("no command given")]
    EmptyCommand,
}

/// Program name plus arguments; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    args: Vec<String>,
}

impl CommandLine {
    /// # Errors
    ///
    /// Returns `PlanError::EmptyCommand` if `args` is empty.
    pub fn new(args: Vec<String>) -> Result<Self, PlanError> {
        if args.is_empty() {
            return Err(PlanError::EmptyCommand);
        }
        Ok(CommandLine { args })
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.args[0]
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args[1..]
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

/// How the coordinator schedules invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One target at a time, in input order
    #[default]
    Sequential,
    /// One OS thread per target, or per worker when `max_parallel` caps them
    Concurrent { max_parallel: Option<NonZeroUsize> },
}

impl Mode {
    #[must_use]
    pub fn concurrent() -> Self {
        Mode::Concurrent { max_parallel: None }
    }
}

/// Everything the coordinator needs for one run; immutable once built
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub targets: Vec<Target>,
    pub command: CommandLine,
    pub mode: Mode,
    pub dry_run: bool,
}

impl ExecutionPlan {
    #[must_use]
    pub fn new(targets: Vec<Target>, command: CommandLine) -> Self {
        ExecutionPlan {
            targets,
            command,
            mode: Mode::default(),
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
