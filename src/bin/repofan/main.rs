mod exec;
mod list;
mod output;
mod path;
mod status;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use repofan::load_config;

#[derive(Parser, Debug)]
#[command(name = "repofan", about = "Run one command across many repositories")]
struct Cli {
    /// Path to config file (auto-detected if not specified)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log file path (logs go to stderr as well)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List repositories and their positions
    List(list::ListArgs),
    /// Print the path of a repository given its position or name
    Path(path::PathArgs),
    /// Execute a command in every selected repository
    Exec(exec::ExecArgs),
    /// Show git status for all repositories (the default)
    Status(status::StatusArgs),
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_ref()
        .map(std::fs::File::create)
        .transpose()?;
    repofan::logger::init(log_file)?;

    let (targets, _config_path) = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::List(ref args)) => list::run(args, &targets),
        Some(Commands::Path(ref args)) => path::run(args, &targets),
        Some(Commands::Exec(ref args)) => exec::run(args, targets),
        Some(Commands::Status(ref args)) => status::run(args, targets),
        None => status::run(&status::StatusArgs::default(), targets),
    }
}
