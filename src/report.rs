//! The change log produced by one traversal.

use crate::diff::{DiffSummary, Palette, render_diff};
use crate::pass::{RuleHit, Unresolved};
use std::fmt;
use std::path::PathBuf;

/// A file whose content was rewritten.
#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: PathBuf,
    pub original: String,
    pub rewritten: String,
    pub hits: Vec<RuleHit>,
    pub backup: Option<PathBuf>,
}

impl FileChange {
    /// Total replacements made in this file.
    pub fn replacements(&self) -> usize {
        self.hits.iter().map(|h| h.count).sum()
    }
}

/// A per-file I/O failure. Failures never abort the traversal.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Unresolved occurrences left in one file.
#[derive(Debug, Clone)]
pub struct UnresolvedFile {
    pub path: PathBuf,
    pub cases: Vec<Unresolved>,
}

/// What happened to one candidate file, reported as the traversal proceeds.
#[derive(Debug)]
pub enum FileOutcome<'a> {
    Changed(&'a FileChange),
    Unchanged(&'a PathBuf),
    Skipped(&'a PathBuf),
    Failed(&'a FileFailure),
}

/// Results of one full traversal.
#[derive(Debug, Default)]
pub struct ChangeLog {
    pub changes: Vec<FileChange>,
    pub failures: Vec<FileFailure>,
    pub unresolved: Vec<UnresolvedFile>,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub summary: DiffSummary,
    pub dry_run: bool,
}

impl ChangeLog {
    /// Returns the number of files that were (or would be) rewritten.
    pub fn files_changed(&self) -> usize {
        self.changes.len()
    }

    /// Total unresolved occurrences across all files.
    pub fn unresolved_count(&self) -> usize {
        self.unresolved.iter().map(|u| u.cases.len()).sum()
    }

    /// Generates a unified diff of all changes.
    pub fn diff(&self) -> String {
        self.render(Palette::Plain)
    }

    /// Generates a colorized diff for terminal display.
    pub fn colorized_diff(&self) -> String {
        self.render(Palette::Ansi)
    }

    fn render(&self, palette: Palette) -> String {
        self.changes
            .iter()
            .map(|c| render_diff(&c.original, &c.rewritten, &c.path, palette))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for ChangeLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would change" } else { "changed" };
        write!(
            f,
            "Total files {verb}: {} (scanned {}, skipped {}, failed {}, unresolved {})",
            self.files_changed(),
            self.files_scanned,
            self.files_skipped,
            self.failures.len(),
            self.unresolved_count()
        )
    }
}
