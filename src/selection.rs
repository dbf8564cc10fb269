//! Resolving user-supplied identifiers to configured targets
//!
//! An identifier is either a 1-based position, an exact target name, or a glob
//! pattern over names. A selection expression is a comma-separated list of
//! identifiers; failures are reported per identifier and never abort the whole
//! selection.

use log::debug;
use thiserror::Error;

use crate::target::Target;

/// Errors for a single identifier in a selection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("index out of range: {index} (1-{len})")]
    OutOfRange { index: i64, len: usize },
    #[error("repository not found: {0}")]
    NotFound(String),
    #[error("no repository matches pattern: {0}")]
    NoMatch(String),
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

const GLOB_CHARS: [char; 3] = ['*', '?', '['];

/// Resolve one identifier to a single target.
///
/// A numeric identifier is a 1-based position; anything else is matched by
/// exact name, and the first match wins if names repeat.
///
/// # Errors
///
/// Returns `SelectionError::OutOfRange` for a number outside `1..=targets.len()`,
/// or `SelectionError::NotFound` if no target carries the name.
pub fn find_target<'a>(
    targets: &'a [Target],
    identifier: &str,
) -> Result<&'a Target, SelectionError> {
    find_position(targets, identifier).map(|pos| &targets[pos])
}

fn find_position(targets: &[Target], identifier: &str) -> Result<usize, SelectionError> {
    if let Ok(index) = identifier.parse::<i64>() {
        return usize::try_from(index)
            .ok()
            .filter(|i| (1..=targets.len()).contains(i))
            .map(|i| i - 1)
            .ok_or(SelectionError::OutOfRange {
                index,
                len: targets.len(),
            });
    }

    targets
        .iter()
        .position(|t| t.name == identifier)
        .ok_or_else(|| SelectionError::NotFound(identifier.to_string()))
}

fn match_pattern(targets: &[Target], pattern: &str) -> Result<Vec<usize>, SelectionError> {
    let compiled = glob::Pattern::new(pattern).map_err(|e| SelectionError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.msg.to_string(),
    })?;
    let positions: Vec<usize> = targets
        .iter()
        .enumerate()
        .filter(|(_, t)| compiled.matches(&t.name))
        .map(|(pos, _)| pos)
        .collect();
    if positions.is_empty() {
        return Err(SelectionError::NoMatch(pattern.to_string()));
    }
    Ok(positions)
}

/// Exact names win over patterns, so a repository literally named `svc[1]`
/// is never confused with the names the pattern would match.
fn resolve_identifier(targets: &[Target], identifier: &str) -> Result<Vec<usize>, SelectionError> {
    match find_position(targets, identifier) {
        Err(SelectionError::NotFound(_)) if identifier.contains(GLOB_CHARS) => {
            match_pattern(targets, identifier)
        }
        found => found.map(|pos| vec![pos]),
    }
}

/// The targets picked by a selection expression plus the identifiers that failed
#[derive(Debug, Default)]
pub struct Selection {
    pub targets: Vec<Target>,
    pub errors: Vec<SelectionError>,
}

/// Resolve a comma-separated selection expression.
///
/// Targets appear in the order their identifiers were given; a target picked
/// more than once keeps its first position.
#[must_use]
pub fn select_targets(targets: &[Target], expression: &str) -> Selection {
    let mut picked: Vec<usize> = Vec::new();
    let mut errors = Vec::new();

    for identifier in expression.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match resolve_identifier(targets, identifier) {
            Ok(positions) => {
                for pos in positions {
                    if picked.contains(&pos) {
                        debug!("Repository '{}' already selected", targets[pos].name);
                    } else {
                        picked.push(pos);
                    }
                }
            }
            Err(e) => errors.push(e),
        }
    }

    Selection {
        targets: picked.into_iter().map(|pos| targets[pos].clone()).collect(),
        errors,
    }
}
