use std::io::{self, Read};
use std::process::{Command as ProcessCommand, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use log::debug;

use super::CommandLine;
use super::outcome::{Outcome, OutcomeKind};
use crate::target::Target;

pub const SKIPPED_MESSAGE: &str = "Skipped (non-local)";

/// Outcome for targets that never reach process execution.
///
/// Non-local targets are skipped before anything else is considered, so a
/// non-local target under dry-run still reports `Skipped`.
#[must_use]
pub fn short_circuit(target: &Target, command: &CommandLine, dry_run: bool) -> Option<Outcome> {
    if !target.is_local {
        debug!("Skipping non-local repository '{}'", target.name);
        return Some(Outcome::synthetic(
            &target.name,
            OutcomeKind::Skipped,
            SKIPPED_MESSAGE.to_string(),
        ));
    }
    if dry_run {
        return Some(Outcome::synthetic(
            &target.name,
            OutcomeKind::DryRun,
            format!(
                "[DRY RUN] Would execute '{command}' in {}",
                target.working_directory.display()
            ),
        ));
    }
    None
}

/// Run `command` against one target. Every failure is reported as a `Failed` outcome.
#[must_use]
pub fn invoke(target: &Target, command: &CommandLine, dry_run: bool) -> Outcome {
    short_circuit(target, command, dry_run).unwrap_or_else(|| execute(target, command))
}

/// Spawn the process in the target's directory and wait for it.
pub(crate) fn execute(target: &Target, command: &CommandLine) -> Outcome {
    debug!(
        "Running '{command}' in {} for '{}'",
        target.working_directory.display(),
        target.name
    );
    let start = Instant::now();
    let captured = run_captured(target, command);
    let duration = start.elapsed();

    match captured {
        Ok(captured) => captured_outcome(target, captured, duration),
        Err(e) => Outcome {
            target_name: target.name.clone(),
            kind: OutcomeKind::Failed,
            output: String::new(),
            error: Some(format!(
                "cannot run '{command}' in {}: {e}",
                target.working_directory.display()
            )),
            exit_code: None,
            duration,
        },
    }
}

/// What a started process left behind
struct Captured {
    output: Vec<u8>,
    status: ExitStatus,
    /// Set when the pipe broke before EOF; `output` holds what was read until then
    read_error: Option<io::Error>,
}

fn captured_outcome(target: &Target, captured: Captured, duration: Duration) -> Outcome {
    let Captured {
        output,
        status,
        read_error,
    } = captured;
    let error = match read_error {
        Some(e) => Some(format!("failed to read output: {e} (process {status})")),
        None if !status.success() => Some(status.to_string()),
        None => None,
    };
    Outcome {
        target_name: target.name.clone(),
        kind: if error.is_some() {
            OutcomeKind::Failed
        } else {
            OutcomeKind::Succeeded
        },
        output: String::from_utf8_lossy(&output).into_owned(),
        error,
        exit_code: status.code(),
        duration,
    }
}

/// Stdout and stderr share one pipe, so both streams land in a single buffer.
///
/// Errors only cover starting and reaping the process; a failed read after
/// spawning is carried in [`Captured::read_error`].
fn run_captured(target: &Target, command: &CommandLine) -> io::Result<Captured> {
    let (mut reader, writer) = io::pipe()?;
    // The builder holds write ends of the pipe; it must be dropped before
    // reading or EOF never arrives.
    let mut child = {
        let mut process = ProcessCommand::new(command.program());
        process
            .args(command.args())
            .current_dir(&target.working_directory)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);
        process.spawn()?
    };

    let mut output = Vec::new();
    let read_error = reader.read_to_end(&mut output).err();
    // Unblock a child still writing into a pipe nobody reads anymore.
    drop(reader);
    let status = child.wait()?;
    Ok(Captured {
        output,
        status,
        read_error,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn cmd(args: &[&str]) -> CommandLine {
        CommandLine::new(args.iter().map(ToString::to_string).collect()).unwrap()
    }

    #[test]
    fn test_skip_takes_precedence_over_dry_run() {
        let target = Target::non_local("remote", "/nowhere", "remote");
        let outcome = invoke(&target, &cmd(&["definitely-not-a-program-xyz"]), true);
        assert_eq!(outcome.kind, OutcomeKind::Skipped);
        assert_eq!(outcome.output, SKIPPED_MESSAGE);
        assert_eq!(outcome.error, None);
    }

    #[test]
    fn test_dry_run_does_not_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("touched");
        let target = Target::local("api", dir.path());
        let outcome = invoke(&target, &cmd(&["touch", "touched"]), true);
        assert_eq!(outcome.kind, OutcomeKind::DryRun);
        assert_eq!(
            outcome.output,
            format!(
                "[DRY RUN] Would execute 'touch touched' in {}",
                dir.path().display()
            )
        );
        assert!(!marker.exists());
    }

    #[test]
    fn test_success_captures_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::local("api", dir.path());
        let outcome = invoke(
            &target,
            &cmd(&["sh", "-c", "echo to-stdout; echo to-stderr 1>&2"]),
            false,
        );
        assert_eq!(outcome.kind, OutcomeKind::Succeeded);
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.output.contains("to-stdout"));
        assert!(outcome.output.contains("to-stderr"));
        assert_eq!(outcome.error, None);
    }

    #[test]
    fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let target = Target::local("api", dir.path());
        let outcome = invoke(&target, &cmd(&["ls"]), false);
        assert_eq!(outcome.kind, OutcomeKind::Succeeded);
        assert!(outcome.output.contains("marker.txt"));
    }

    #[test]
    fn test_non_zero_exit_keeps_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::local("api", dir.path());
        let outcome = invoke(&target, &cmd(&["sh", "-c", "echo partial; exit 3"]), false);
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.output, "partial\n");
        assert!(outcome.error.unwrap().contains('3'));
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::local("gone", dir.path().join("missing"));
        let outcome = invoke(&target, &cmd(&["echo", "hi"]), false);
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(outcome.output.is_empty());
        assert!(outcome.error.unwrap().starts_with("cannot run 'echo hi'"));
    }

    #[test]
    fn test_read_failure_keeps_status_and_partial_output() {
        use std::os::unix::process::ExitStatusExt;

        let target = Target::local("api", "/src/api");
        let captured = Captured {
            output: b"half a li".to_vec(),
            status: ExitStatus::from_raw(0),
            read_error: Some(io::Error::other("pipe closed")),
        };
        let outcome = captured_outcome(&target, captured, Duration::ZERO);
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert_eq!(outcome.output, "half a li");
        assert_eq!(outcome.exit_code, Some(0));
        let error = outcome.error.unwrap();
        assert!(error.starts_with("failed to read output: pipe closed"));
        assert!(!error.contains("cannot run"));
    }

    #[test]
    fn test_missing_program_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::local("api", dir.path());
        let outcome = invoke(&target, &cmd(&["definitely-not-a-program-xyz"]), false);
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert_eq!(outcome.exit_code, None);
    }
}
