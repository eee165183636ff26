//! The traversal: select files, run a pipeline over each, write back.

use crate::diff::DiffSummary;
use crate::error::{MigrateError, Result};
use crate::pass::Pipeline;
use crate::presets::Preset;
use crate::record::FileRecord;
use crate::report::{ChangeLog, FileChange, FileFailure, FileOutcome, UnresolvedFile};
use crate::selector::FileSelector;
use std::path::PathBuf;
use tracing::{info, warn};

type FileCallback<'a> = Box<dyn FnMut(&FileOutcome<'_>) + 'a>;

/// Builder for one migration run over a directory tree.
///
/// ```rust,no_run
/// use assert_migrate::prelude::*;
///
/// let log = Migration::preset("./tests", &fluent_to_xunit())?
///     .dry_run()
///     .apply()?;
/// println!("{}", log.diff());
/// # Ok::<(), assert_migrate::error::MigrateError>(())
/// ```
pub struct Migration<'a> {
    root: PathBuf,
    pipeline: Pipeline,
    selector: FileSelector,
    dry_run: bool,
    backup_suffix: Option<String>,
    on_file: Option<FileCallback<'a>>,
}

impl<'a> Migration<'a> {
    /// Runs `pipeline` over every `.cs` file under `root`.
    pub fn new(root: impl Into<PathBuf>, pipeline: Pipeline) -> Self {
        Self {
            root: root.into(),
            pipeline,
            selector: FileSelector::new().extension("cs"),
            dry_run: false,
            backup_suffix: None,
            on_file: None,
        }
    }

    /// Runs a pre-built migration with its own file selection.
    pub fn preset(root: impl Into<PathBuf>, preset: &dyn Preset) -> Result<Self> {
        Ok(Self::new(root, preset.pipeline()?).selecting(preset.selector()))
    }

    /// Replaces the file selection.
    pub fn selecting(mut self, selector: FileSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Computes changes without writing anything.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Saves each original next to its rewrite, e.g. `Foo.cs.bak`.
    pub fn backup(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = Some(suffix.into());
        self
    }

    /// Called once per candidate file as soon as it is finished.
    pub fn on_file<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&FileOutcome<'_>) + 'a,
    {
        self.on_file = Some(Box::new(callback));
        self
    }

    /// Runs the traversal. Only a missing root, a bad glob or an invalid
    /// pipeline is an error; per-file failures land in the change log.
    pub fn apply(mut self) -> Result<ChangeLog> {
        if !self.root.is_dir() {
            return Err(MigrateError::RootNotFound(self.root));
        }
        self.pipeline.validate()?;

        let selector = if self.selector.has_markers() {
            self.selector.clone()
        } else {
            self.selector.clone().markers(self.pipeline.markers().iter().cloned())
        };
        let candidates = selector.collect(&self.root)?;

        let mut log = ChangeLog {
            dry_run: self.dry_run,
            failures: candidates.failures,
            ..Default::default()
        };
        for failure in &log.failures {
            self.notify(&FileOutcome::Failed(failure));
        }

        for path in candidates.paths {
            log.files_scanned += 1;

            let mut record = match FileRecord::read(&path) {
                Ok(record) => record,
                Err(err) => {
                    self.fail(&mut log, path, err);
                    continue;
                }
            };

            if !selector.admits(&record.original) {
                log.files_skipped += 1;
                self.notify(&FileOutcome::Skipped(&path));
                continue;
            }

            let outcome = self.pipeline.run(&record.original);
            let cases = self.pipeline.unresolved(&outcome.text);
            for case in &cases {
                warn!(
                    path = %path.display(),
                    line = case.line,
                    snippet = %case.snippet,
                    "unresolved occurrence"
                );
            }
            if !cases.is_empty() {
                log.unresolved.push(UnresolvedFile {
                    path: path.clone(),
                    cases,
                });
            }

            record.text = outcome.text;
            if !record.is_modified() {
                self.notify(&FileOutcome::Unchanged(&path));
                continue;
            }

            let backup = if self.dry_run {
                None
            } else {
                match record.write(self.backup_suffix.as_deref()) {
                    Ok(backup) => backup,
                    Err(err) => {
                        self.fail(&mut log, path, err);
                        continue;
                    }
                }
            };

            let change = FileChange {
                path: record.path,
                original: record.original,
                rewritten: record.text,
                hits: outcome.hits,
                backup,
            };
            info!(
                path = %change.path.display(),
                replacements = change.replacements(),
                dry_run = self.dry_run,
                "file rewritten"
            );
            log.summary
                .merge(&DiffSummary::from_diff(&change.original, &change.rewritten));
            self.notify(&FileOutcome::Changed(&change));
            log.changes.push(change);
        }

        Ok(log)
    }

    /// Runs as a dry run and returns the unified diff.
    pub fn preview(self) -> Result<String> {
        Ok(self.dry_run().apply()?.diff())
    }

    fn fail(&mut self, log: &mut ChangeLog, path: PathBuf, err: MigrateError) {
        warn!(path = %path.display(), error = %err, "cannot process file");
        let failure = FileFailure {
            path,
            message: err.to_string(),
        };
        self.notify(&FileOutcome::Failed(&failure));
        log.failures.push(failure);
    }

    fn notify(&mut self, outcome: &FileOutcome<'_>) {
        if let Some(callback) = self.on_file.as_mut() {
            callback(outcome);
        }
    }
}
