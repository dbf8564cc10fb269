//! Rendering targets and outcomes as text or JSON

use std::io::{self, Write};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::exec::{Outcome, OutcomeKind, OutcomeSink, Summary};
use crate::target::Target;
use crate::theme::{self, paint};

/// What a report describes; picks the text title and the JSON output key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Exec,
    Status,
}

impl ReportKind {
    fn title(self) -> &'static str {
        match self {
            ReportKind::Exec => "Output",
            ReportKind::Status => "Git status",
        }
    }
}

/// Renders one outcome at a time as a self-contained text block
#[derive(Debug, Clone, Copy)]
pub struct TextPresenter {
    pub kind: ReportKind,
    pub color: bool,
}

impl TextPresenter {
    #[must_use]
    pub fn new(kind: ReportKind, color: bool) -> Self {
        TextPresenter { kind, color }
    }

    /// Header, optional error line and body for one outcome.
    #[must_use]
    pub fn render_block(&self, outcome: &Outcome) -> String {
        match outcome.kind {
            OutcomeKind::Skipped => {
                let header = format!(
                    "--- Skipping non-local repository: {} ---",
                    outcome.target_name
                );
                format!("{}\n", paint(theme::DIM, &header, self.color))
            }
            OutcomeKind::DryRun => format!("{}\n", outcome.output),
            OutcomeKind::Succeeded | OutcomeKind::Failed => {
                let style = if outcome.kind == OutcomeKind::Failed {
                    theme::HEADER_FAILED
                } else if outcome.is_blank() {
                    theme::HEADER_CLEAN
                } else {
                    theme::HEADER_CHANGED
                };
                let header = format!("--- {} for {} ---", self.kind.title(), outcome.target_name);
                let mut block = format!("{}\n", paint(style, &header, self.color));
                if let Some(ref error) = outcome.error {
                    block.push_str(&format!("Error: {error}\n"));
                }
                block.push_str(&outcome.output);
                block.push('\n');
                block
            }
        }
    }

    /// Render a whole run in target order.
    #[must_use]
    pub fn render_all(&self, outcomes: &[Outcome]) -> String {
        outcomes.iter().map(|o| self.render_block(o)).collect()
    }
}

/// Streams rendered blocks to a writer; each block is written under one lock
/// so concurrent targets never interleave.
pub struct TextSink<W> {
    presenter: TextPresenter,
    hide_blank: bool,
    out: Mutex<W>,
    error: Mutex<Option<io::Error>>,
}

impl<W: Write + Send> TextSink<W> {
    #[must_use]
    pub fn new(presenter: TextPresenter, out: W) -> Self {
        TextSink {
            presenter,
            hide_blank: false,
            out: Mutex::new(out),
            error: Mutex::new(None),
        }
    }

    /// Drop outcomes whose process printed nothing.
    #[must_use]
    pub fn hide_blank(mut self, hide: bool) -> Self {
        self.hide_blank = hide;
        self
    }

    /// Return the writer, or the first write error hit while streaming.
    ///
    /// # Errors
    ///
    /// Returns the first `io::Error` raised by the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        if let Some(e) = self.error.into_inner() {
            return Err(e);
        }
        Ok(self.out.into_inner())
    }
}

impl<W: Write + Send> OutcomeSink for TextSink<W> {
    fn outcome_ready(&self, _index: usize, outcome: &Outcome) {
        if self.hide_blank && outcome.is_blank() {
            return;
        }
        let block = self.presenter.render_block(outcome);
        let mut out = self.out.lock();
        if let Err(e) = out.write_all(block.as_bytes()).and_then(|()| out.flush()) {
            let mut slot = self.error.lock();
            if slot.is_none() {
                *slot = Some(e);
            }
        }
    }
}

#[derive(Serialize)]
enum Body<'a> {
    #[serde(rename = "output")]
    Output(&'a str),
    #[serde(rename = "status")]
    Status(&'a str),
}

#[derive(Serialize)]
struct OutcomeRecord<'a> {
    name: &'a str,
    kind: OutcomeKind,
    #[serde(flatten)]
    body: Body<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    duration_ms: u128,
}

/// Render outcomes as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails.
pub fn render_json<'a>(
    kind: ReportKind,
    outcomes: impl IntoIterator<Item = &'a Outcome>,
) -> serde_json::Result<String> {
    let records: Vec<OutcomeRecord<'_>> = outcomes
        .into_iter()
        .map(|o| OutcomeRecord {
            name: &o.target_name,
            kind: o.kind,
            body: match kind {
                ReportKind::Exec => Body::Output(&o.output),
                ReportKind::Status => Body::Status(&o.output),
            },
            error: o.error.as_deref(),
            exit_code: o.exit_code,
            duration_ms: o.duration.as_millis(),
        })
        .collect();
    serde_json::to_string_pretty(&records)
}

#[derive(Serialize)]
struct TargetRecord<'a> {
    index: usize,
    name: &'a str,
    location: String,
    #[serde(rename = "locationtype")]
    location_type: &'a str,
}

/// `N: name (location) (type)` lines, one per target.
#[must_use]
pub fn render_targets_text(targets: &[Target]) -> String {
    targets
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "{}: {} ({}) ({})\n",
                i + 1,
                t.name,
                t.working_directory.display(),
                t.location_type
            )
        })
        .collect()
}

/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails.
pub fn render_targets_json(targets: &[Target]) -> serde_json::Result<String> {
    let records: Vec<TargetRecord<'_>> = targets
        .iter()
        .enumerate()
        .map(|(i, t)| TargetRecord {
            index: i + 1,
            name: &t.name,
            location: t.working_directory.display().to_string(),
            location_type: &t.location_type,
        })
        .collect();
    serde_json::to_string_pretty(&records)
}

/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails.
pub fn render_path_json(target: &Target) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "path": target.working_directory.display().to_string(),
    }))
}

#[must_use]
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let tenths = d.subsec_millis() / 100;
    if total_secs < 60 {
        format!("{total_secs}.{tenths}s")
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{mins}m {secs}.{tenths}s")
    }
}

/// One-line tally such as `3 repositories: 2 succeeded, 1 failed (0.4s)`.
#[must_use]
pub fn render_summary(summary: &Summary, elapsed: Duration, color: bool) -> String {
    let mut parts = Vec::new();
    if summary.succeeded > 0 {
        parts.push(paint(
            theme::SUCCESS,
            &format!("{} succeeded", summary.succeeded),
            color,
        ));
    }
    if summary.failed > 0 {
        parts.push(paint(
            theme::FAILURE,
            &format!("{} failed", summary.failed),
            color,
        ));
    }
    if summary.skipped > 0 {
        parts.push(paint(
            theme::SKIPPED,
            &format!("{} skipped", summary.skipped),
            color,
        ));
    }
    if summary.dry_run > 0 {
        parts.push(format!("{} dry run", summary.dry_run));
    }

    let elapsed = paint(theme::DIM, &format!("({})", format_duration(elapsed)), color);
    let total = summary.total();
    if total == 0 {
        return format!("{} {elapsed}", paint(theme::BOLD, "no repositories", color));
    }
    let noun = if total == 1 { "repository" } else { "repositories" };
    format!(
        "{} {} {}",
        paint(theme::BOLD, &format!("{total} {noun}:"), color),
        parts.join(&paint(theme::DIM, ", ", color)),
        elapsed
    )
}
