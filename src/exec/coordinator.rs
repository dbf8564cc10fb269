use std::time::Duration;

use log::{debug, info};

use super::invoker;
use super::outcome::{Outcome, OutcomeKind};
use super::{ExecutionPlan, Mode};
use crate::target::Target;

/// Receives each outcome as soon as it is produced.
///
/// In concurrent mode calls arrive from worker threads in completion order;
/// `index` is the target's position in the plan.
pub trait OutcomeSink: Sync {
    fn outcome_ready(&self, index: usize, outcome: &Outcome);
}

impl OutcomeSink for () {
    fn outcome_ready(&self, _index: usize, _outcome: &Outcome) {}
}

/// Run the plan and return one outcome per target, in target order.
#[must_use]
pub fn run(plan: &ExecutionPlan) -> Vec<Outcome> {
    run_with_sink(plan, &())
}

/// Like [`run`], streaming every outcome to `sink` as it completes.
#[must_use]
pub fn run_with_sink(plan: &ExecutionPlan, sink: &dyn OutcomeSink) -> Vec<Outcome> {
    info!(
        "Running '{}' across {} repositories ({:?}{})",
        plan.command,
        plan.targets.len(),
        plan.mode,
        if plan.dry_run { ", dry run" } else { "" }
    );
    match plan.mode {
        Mode::Sequential => run_sequential(plan, sink),
        Mode::Concurrent { max_parallel } => {
            run_concurrent(plan, max_parallel.map(std::num::NonZeroUsize::get), sink)
        }
    }
}

fn run_sequential(plan: &ExecutionPlan, sink: &dyn OutcomeSink) -> Vec<Outcome> {
    plan.targets
        .iter()
        .enumerate()
        .map(|(index, target)| {
            let outcome = invoker::invoke(target, &plan.command, plan.dry_run);
            sink.outcome_ready(index, &outcome);
            outcome
        })
        .collect()
}

/// A pending invocation: target position, target, and the slot it alone writes.
type Job<'a> = (usize, &'a Target, &'a mut Option<Outcome>);

fn run_concurrent(
    plan: &ExecutionPlan,
    max_parallel: Option<usize>,
    sink: &dyn OutcomeSink,
) -> Vec<Outcome> {
    let mut slots: Vec<Option<Outcome>> = vec![None; plan.targets.len()];

    let mut pending: Vec<Job<'_>> = Vec::new();
    for (index, (slot, target)) in slots.iter_mut().zip(&plan.targets).enumerate() {
        match invoker::short_circuit(target, &plan.command, plan.dry_run) {
            Some(outcome) => {
                sink.outcome_ready(index, &outcome);
                *slot = Some(outcome);
            }
            None => pending.push((index, target, slot)),
        }
    }

    let workers = max_parallel.map_or(pending.len(), |cap| cap.min(pending.len()));
    if workers > 0 {
        debug!(
            "Spawning {workers} workers for {} invocations",
            pending.len()
        );
        let mut buckets: Vec<Vec<Job<'_>>> = (0..workers).map(|_| Vec::new()).collect();
        for (n, job) in pending.into_iter().enumerate() {
            buckets[n % workers].push(job);
        }

        std::thread::scope(|s| {
            for bucket in buckets {
                s.spawn(move || {
                    for (index, target, slot) in bucket {
                        let outcome = invoker::execute(target, &plan.command);
                        sink.outcome_ready(index, &outcome);
                        *slot = Some(outcome);
                    }
                });
            }
        });
    }

    slots
        .into_iter()
        .zip(&plan.targets)
        .map(|(slot, target)| slot.unwrap_or_else(|| unfinished(target)))
        .collect()
}

fn unfinished(target: &Target) -> Outcome {
    Outcome {
        target_name: target.name.clone(),
        kind: OutcomeKind::Failed,
        output: String::new(),
        error: Some("invocation did not complete".to_string()),
        exit_code: None,
        duration: Duration::ZERO,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::collections::HashSet;
    use std::num::NonZeroUsize;
    use std::path::Path;

    use parking_lot::Mutex;

    use super::*;
    use crate::exec::CommandLine;

    fn cmd(args: &[&str]) -> CommandLine {
        CommandLine::new(args.iter().map(ToString::to_string).collect()).unwrap()
    }

    /// Targets whose directory name is their target name, so `basename "$PWD"` echoes it.
    fn named_targets(root: &Path, names: &[&str]) -> Vec<Target> {
        names
            .iter()
            .map(|name| {
                let dir = root.join(name);
                std::fs::create_dir_all(&dir).unwrap();
                Target::local(*name, dir)
            })
            .collect()
    }

    const ECHO_NAME: [&str; 3] = ["sh", "-c", "basename \"$PWD\""];

    fn assert_aligned(outcomes: &[Outcome], targets: &[Target]) {
        assert_eq!(outcomes.len(), targets.len());
        for (outcome, target) in outcomes.iter().zip(targets) {
            assert_eq!(outcome.target_name, target.name);
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<usize>>,
    }

    impl OutcomeSink for Recorder {
        fn outcome_ready(&self, index: usize, _outcome: &Outcome) {
            self.seen.lock().push(index);
        }
    }

    #[test]
    fn test_index_alignment_both_modes() {
        let dir = tempfile::tempdir().unwrap();
        let mut targets = named_targets(dir.path(), &["a", "b", "c", "d"]);
        targets.insert(2, Target::non_local("far", "host:far", "remote"));

        for mode in [Mode::Sequential, Mode::concurrent()] {
            let plan = ExecutionPlan::new(targets.clone(), cmd(&ECHO_NAME)).with_mode(mode);
            let outcomes = run(&plan);
            assert_aligned(&outcomes, &targets);
            assert_eq!(outcomes[2].kind, OutcomeKind::Skipped);
            assert_eq!(outcomes[3].output.trim(), "c");
        }
    }

    #[test]
    fn test_empty_target_list() {
        let plan = ExecutionPlan::new(vec![], cmd(&["true"])).with_mode(Mode::concurrent());
        assert!(run(&plan).is_empty());
    }

    #[test]
    fn test_dry_run_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let targets = named_targets(dir.path(), &["a", "b"]);
        let plan = ExecutionPlan::new(targets.clone(), cmd(&["touch", "ran"]))
            .with_mode(Mode::concurrent())
            .with_dry_run(true);
        let outcomes = run(&plan);
        assert_aligned(&outcomes, &targets);
        for (outcome, target) in outcomes.iter().zip(&targets) {
            assert_eq!(outcome.kind, OutcomeKind::DryRun);
            assert!(outcome.output.contains("'touch ran'"));
            assert!(!target.working_directory.join("ran").exists());
        }
    }

    #[test]
    fn test_failure_isolation() {
        let dir = tempfile::tempdir().unwrap();
        let mut targets = named_targets(dir.path(), &["first", "third"]);
        targets.insert(1, Target::local("second", dir.path().join("does-not-exist")));

        for mode in [Mode::Sequential, Mode::concurrent()] {
            let plan = ExecutionPlan::new(targets.clone(), cmd(&ECHO_NAME)).with_mode(mode);
            let outcomes = run(&plan);
            assert_aligned(&outcomes, &targets);
            assert_eq!(outcomes[0].kind, OutcomeKind::Succeeded);
            assert_eq!(outcomes[0].output.trim(), "first");
            assert_eq!(outcomes[1].kind, OutcomeKind::Failed);
            assert!(outcomes[1].error.is_some());
            assert_eq!(outcomes[2].kind, OutcomeKind::Succeeded);
            assert_eq!(outcomes[2].output.trim(), "third");
        }
    }

    #[test]
    fn test_mode_equivalence() {
        let dir = tempfile::tempdir().unwrap();
        let targets = named_targets(dir.path(), &["one", "two", "three", "four"]);
        let plan = ExecutionPlan::new(targets, cmd(&ECHO_NAME));

        let sequential = run(&plan);
        let concurrent = run(&plan.clone().with_mode(Mode::concurrent()));

        let key = |o: &Outcome| (o.target_name.clone(), o.kind, o.output.clone());
        assert_eq!(
            sequential.iter().map(key).collect::<Vec<_>>(),
            concurrent.iter().map(key).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_sequential_streams_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let targets = named_targets(dir.path(), &["a", "b", "c"]);
        let plan = ExecutionPlan::new(targets, cmd(&["true"]));
        let recorder = Recorder::default();
        let outcomes = run_with_sink(&plan, &recorder);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(*recorder.seen.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_concurrent_slot_safety() {
        let dir = tempfile::tempdir().unwrap();
        let names: Vec<String> = (0..50).map(|i| format!("repo-{i:02}")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let targets = named_targets(dir.path(), &name_refs);
        for (i, target) in targets.iter().enumerate() {
            let delay_ms = (i * 7919) % 40;
            std::fs::write(
                target.working_directory.join("delay"),
                format!("0.{delay_ms:03}"),
            )
            .unwrap();
        }
        let command = cmd(&["sh", "-c", "sleep \"$(cat delay)\"; basename \"$PWD\""]);

        for max_parallel in [None, NonZeroUsize::new(7)] {
            for _ in 0..3 {
                let plan = ExecutionPlan::new(targets.clone(), command.clone())
                    .with_mode(Mode::Concurrent { max_parallel });
                let recorder = Recorder::default();
                let outcomes = run_with_sink(&plan, &recorder);

                assert_aligned(&outcomes, &targets);
                let unique: HashSet<&str> =
                    outcomes.iter().map(|o| o.target_name.as_str()).collect();
                assert_eq!(unique.len(), 50);
                for outcome in &outcomes {
                    assert_eq!(outcome.kind, OutcomeKind::Succeeded, "{outcome:?}");
                    assert_eq!(outcome.output.trim(), outcome.target_name);
                }
                let mut seen = recorder.seen.lock().clone();
                seen.sort_unstable();
                assert_eq!(seen, (0..50).collect::<Vec<_>>());
            }
        }
    }
}
