use std::process::ExitCode;

use clap::Args;

use repofan::exec::{CommandLine, ExecutionPlan};
use repofan::report::ReportKind;
use repofan::target::Target;

use crate::output::{self, ModeArgs, OutputArgs};

#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Use short status format
    #[arg(long)]
    short: bool,

    /// Only show repositories with changes
    #[arg(long)]
    dirty: bool,

    #[command(flatten)]
    mode: ModeArgs,

    #[command(flatten)]
    output: OutputArgs,
}

impl StatusArgs {
    fn command(&self) -> Vec<String> {
        let mut args = vec!["git".to_string(), "status".to_string()];
        if self.short {
            args.push("-s".to_string());
        }
        args
    }
}

/// Show `git status` for every repository.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn run(
    args: &StatusArgs,
    targets: Vec<Target>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let plan = ExecutionPlan::new(targets, CommandLine::new(args.command())?)
        .with_mode(args.mode.mode());
    output::emit(&plan, ReportKind::Status, &args.output, args.dirty)
}
