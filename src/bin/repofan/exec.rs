use std::process::ExitCode;

use clap::Args;

use repofan::exec::{CommandLine, ExecutionPlan};
use repofan::report::ReportKind;
use repofan::selection::select_targets;
use repofan::target::Target;

use crate::output::{self, ModeArgs, OutputArgs};

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Comma-separated repository positions, names or name patterns
    #[arg(long)]
    repos: Option<String>,

    /// Show what would be executed, without running anything
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    mode: ModeArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Program and arguments to run in each repository
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

/// Run the command across the selected repositories.
///
/// Identifiers that fail to resolve are reported and skipped; the run goes on
/// with the rest.
///
/// # Errors
///
/// Returns an error if the command is empty or the output cannot be written.
pub fn run(args: &ExecArgs, targets: Vec<Target>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let command = CommandLine::new(args.command.clone())?;

    let selected = match args.repos {
        Some(ref expression) => {
            let selection = select_targets(&targets, expression);
            for e in &selection.errors {
                eprintln!("Error: {e}");
            }
            selection.targets
        }
        None => targets,
    };

    let plan = ExecutionPlan::new(selected, command)
        .with_mode(args.mode.mode())
        .with_dry_run(args.dry_run);
    output::emit(&plan, ReportKind::Exec, &args.output, false)
}
