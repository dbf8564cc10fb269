use std::process::ExitCode;

use clap::Args;

use repofan::report::{render_targets_json, render_targets_text};
use repofan::target::Target;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Print every configured repository with its 1-based position.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(args: &ListArgs, targets: &[Target]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if args.json {
        println!("{}", render_targets_json(targets)?);
    } else {
        print!("{}", render_targets_text(targets));
    }
    Ok(ExitCode::SUCCESS)
}
