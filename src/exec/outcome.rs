use std::time::Duration;

use serde::Serialize;

/// Terminal state of one target's invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Skipped,
    DryRun,
    Succeeded,
    Failed,
}

/// Result of attempting (or skipping) the command against one target
#[derive(Debug, Clone)]
pub struct Outcome {
    pub target_name: String,
    pub kind: OutcomeKind,
    /// Combined stdout/stderr for executed targets, a synthetic message otherwise
    pub output: String,
    pub error: Option<String>,
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl Outcome {
    pub(crate) fn synthetic(target_name: &str, kind: OutcomeKind, output: String) -> Self {
        Outcome {
            target_name: target_name.to_string(),
            kind,
            output,
            error: None,
            exit_code: None,
            duration: Duration::ZERO,
        }
    }

    /// True when the process succeeded and printed nothing but whitespace.
    ///
    /// Failed outcomes are never blank, so filtering on this cannot hide an error.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.kind == OutcomeKind::Succeeded && self.output.trim().is_empty()
    }
}

/// Per-kind tallies over a finished run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub dry_run: usize,
}

impl Summary {
    #[must_use]
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        outcomes.iter().fold(Summary::default(), |mut acc, o| {
            match o.kind {
                OutcomeKind::Succeeded => acc.succeeded += 1,
                OutcomeKind::Failed => acc.failed += 1,
                OutcomeKind::Skipped => acc.skipped += 1,
                OutcomeKind::DryRun => acc.dry_run += 1,
            }
            acc
        })
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped + self.dry_run
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
