use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Args;
use log::debug;

use repofan::exec::{self, ExecutionPlan, Mode, Summary};
use repofan::report::{ReportKind, TextPresenter, TextSink, render_json, render_summary};

#[derive(Args, Debug, Default)]
pub struct ModeArgs {
    /// Run the command in all repositories in parallel
    #[arg(long, visible_alias = "async")]
    parallel: bool,

    /// Maximum number of repositories processed at once with --parallel
    #[arg(short, long, requires = "parallel")]
    jobs: Option<NonZeroUsize>,
}

impl ModeArgs {
    pub fn mode(&self) -> Mode {
        if self.parallel {
            Mode::Concurrent {
                max_parallel: self.jobs,
            }
        } else {
            Mode::Sequential
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Never colorize output
    #[arg(long)]
    no_color: bool,
}

impl OutputArgs {
    fn open(&self) -> io::Result<Box<dyn Write + Send>> {
        Ok(match self.output {
            Some(ref path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(io::stdout()),
        })
    }

    /// Headers are colored only on an interactive stdout.
    fn body_color(&self) -> bool {
        !self.no_color && self.output.is_none() && io::stdout().is_terminal()
    }

    fn summary_color(&self) -> bool {
        !self.no_color && io::stderr().is_terminal()
    }
}

/// Run the plan and render its outcomes; fails the process if any target failed.
///
/// # Errors
///
/// Returns an error if the output cannot be written or serialized.
pub fn emit(
    plan: &ExecutionPlan,
    kind: ReportKind,
    args: &OutputArgs,
    hide_blank: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut out = args.open()?;
    let start = Instant::now();

    let outcomes = if args.json {
        let outcomes = exec::run(plan);
        let visible = outcomes.iter().filter(|o| !(hide_blank && o.is_blank()));
        writeln!(out, "{}", render_json(kind, visible)?)?;
        out.flush()?;
        outcomes
    } else {
        let sink = TextSink::new(TextPresenter::new(kind, args.body_color()), out)
            .hide_blank(hide_blank);
        let outcomes = exec::run_with_sink(plan, &sink);
        sink.finish()?.flush()?;
        let summary = Summary::from_outcomes(&outcomes);
        eprintln!(
            "{}",
            render_summary(&summary, start.elapsed(), args.summary_color())
        );
        outcomes
    };

    let summary = Summary::from_outcomes(&outcomes);
    debug!("Finished run: {summary:?}");
    Ok(if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
