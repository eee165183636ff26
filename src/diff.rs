//! Diff generation for previewing rewrites.

use similar::{ChangeTag, TextDiff};
use std::fmt::Write;
use std::path::Path;

/// How diff lines are decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Plain,
    Ansi,
}

impl Palette {
    fn paint(self, tag: Option<ChangeTag>) -> (&'static str, &'static str) {
        const RED: &str = "\x1b[31m";
        const GREEN: &str = "\x1b[32m";
        const CYAN: &str = "\x1b[36m";
        const RESET: &str = "\x1b[0m";

        match (self, tag) {
            (Palette::Plain, _) | (Palette::Ansi, Some(ChangeTag::Equal)) => ("", ""),
            (Palette::Ansi, Some(ChangeTag::Delete)) => (RED, RESET),
            (Palette::Ansi, Some(ChangeTag::Insert)) => (GREEN, RESET),
            (Palette::Ansi, None) => (CYAN, RESET),
        }
    }
}

/// Renders a unified diff between two buffers.
pub fn render_diff(original: &str, rewritten: &str, path: &Path, palette: Palette) -> String {
    let diff = TextDiff::from_lines(original, rewritten);
    let mut output = String::new();
    let (open, close) = palette.paint(None);

    writeln!(&mut output, "{open}--- a/{}{close}", path.display()).unwrap();
    writeln!(&mut output, "{open}+++ b/{}{close}", path.display()).unwrap();

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push('\n');
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                let (open, close) = palette.paint(Some(change.tag()));
                write!(&mut output, "{open}{sign}{}{close}", change.value()).unwrap();
                if change.missing_newline() {
                    output.push('\n');
                }
            }
        }
    }

    output
}

/// Generates a plain unified diff.
pub fn unified_diff(original: &str, rewritten: &str, path: &Path) -> String {
    render_diff(original, rewritten, path, Palette::Plain)
}

/// Line-level totals for a set of rewrites.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiffSummary {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    /// Creates a summary from original and rewritten content.
    pub fn from_diff(original: &str, rewritten: &str) -> Self {
        let diff = TextDiff::from_lines(original, rewritten);
        let (insertions, deletions) =
            diff.iter_all_changes()
                .fold((0, 0), |(ins, del), change| match change.tag() {
                    ChangeTag::Insert => (ins + 1, del),
                    ChangeTag::Delete => (ins, del + 1),
                    ChangeTag::Equal => (ins, del),
                });

        Self {
            files_changed: usize::from(insertions + deletions > 0),
            insertions,
            deletions,
        }
    }

    /// Combines two summaries.
    pub fn merge(&mut self, other: &DiffSummary) {
        self.files_changed += other.files_changed;
        self.insertions += other.insertions;
        self.deletions += other.deletions;
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} file(s) changed, {} insertions(+), {} deletions(-)",
            self.files_changed, self.insertions, self.deletions
        )
    }
}
