use std::process::ExitCode;

use clap::Args;

use repofan::report::render_path_json;
use repofan::selection::find_target;
use repofan::target::Target;

#[derive(Args, Debug)]
pub struct PathArgs {
    /// Repository position (1-based) or name
    identifier: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Print the location of one repository.
///
/// # Errors
///
/// Returns an error if the identifier does not resolve or JSON serialization fails.
pub fn run(args: &PathArgs, targets: &[Target]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let target = find_target(targets, &args.identifier)?;
    if args.json {
        println!("{}", render_path_json(target)?);
    } else {
        println!("{}", target.working_directory.display());
    }
    Ok(ExitCode::SUCCESS)
}
