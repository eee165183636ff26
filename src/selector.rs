//! Candidate file selection: extension, globs and a marker pre-check.

use crate::error::Result;
use crate::report::FileFailure;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Paths found under a root, plus entries the walk could not read.
#[derive(Debug, Default)]
pub struct Candidates {
    pub paths: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

/// Predicates for choosing which files a pipeline sees.
#[derive(Default, Clone, Debug)]
pub struct FileSelector {
    extensions: Vec<String>,
    include_globs: Vec<String>,
    exclude_globs: Vec<String>,
    markers: Vec<String>,
}

impl FileSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects files with the given extension (without dot).
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.push(ext.into().trim_start_matches('.').to_string());
        self
    }

    /// Selects files with any of the given extensions.
    pub fn extensions(self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        exts.into_iter().fold(self, |sel, ext| sel.extension(ext))
    }

    /// Includes only files matching the glob pattern.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_globs.push(pattern.into());
        self
    }

    /// Excludes files matching the glob pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_globs.push(pattern.into());
        self
    }

    /// Admits only buffers containing at least one of the markers.
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }

    /// Replaces the marker list.
    pub fn markers(mut self, markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_markers(&self) -> bool {
        !self.markers.is_empty()
    }

    /// Cheap substring pre-check. With no markers every buffer is admitted.
    pub fn admits(&self, content: &str) -> bool {
        self.markers.is_empty() || self.markers.iter().any(|m| content.contains(m.as_str()))
    }

    /// Walks `root` and returns every file passing the path predicates,
    /// sorted by path.
    pub fn collect(&self, root: &Path) -> Result<Candidates> {
        let include_set = build_glob_set(&self.include_globs)?;
        let exclude_set = build_glob_set(&self.exclude_globs)?;
        let mut candidates = Candidates::default();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    warn!(path = %path.display(), error = %err, "cannot walk entry");
                    candidates.failures.push(FileFailure {
                        path,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }

            if !self.extensions.is_empty() {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if !self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
                    continue;
                }
            }

            let rel_path = path.strip_prefix(root).unwrap_or(path);
            if !self.include_globs.is_empty() && !include_set.is_match(rel_path) {
                continue;
            }
            if exclude_set.is_match(rel_path) {
                continue;
            }

            candidates.paths.push(path.to_path_buf());
        }

        Ok(candidates)
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_files(dir: &Path) {
        fs::create_dir_all(dir.join("Tests/Unit")).unwrap();
        fs::create_dir_all(dir.join("obj")).unwrap();

        fs::write(dir.join("Tests/Unit/MachineTests.cs"), "x.Should().Be(1);").unwrap();
        fs::write(dir.join("Tests/Unit/Helpers.cs"), "static class Helpers {}").unwrap();
        fs::write(dir.join("Tests/Script.json"), "{}").unwrap();
        fs::write(dir.join("obj/Generated.cs"), "y.Should().Be(2);").unwrap();
        fs::write(dir.join("Root.CS"), "// upper-case extension").unwrap();
    }

    #[test]
    fn test_filter_by_extension() {
        let dir = TempDir::new().unwrap();
        create_test_files(dir.path());

        let found = FileSelector::new().extension("cs").collect(dir.path()).unwrap();
        assert_eq!(found.paths.len(), 4);
        assert!(found.failures.is_empty());
    }

    #[test]
    fn test_dotted_extension_accepted() {
        let dir = TempDir::new().unwrap();
        create_test_files(dir.path());

        let found = FileSelector::new().extension(".json").collect(dir.path()).unwrap();
        assert_eq!(found.paths.len(), 1);
    }

    #[test]
    fn test_exclude_glob() {
        let dir = TempDir::new().unwrap();
        create_test_files(dir.path());

        let found = FileSelector::new()
            .extension("cs")
            .exclude("**/obj/**")
            .collect(dir.path())
            .unwrap();
        assert_eq!(found.paths.len(), 3);
        assert!(found.paths.iter().all(|p| !p.to_string_lossy().contains("obj")));
    }

    #[test]
    fn test_include_glob() {
        let dir = TempDir::new().unwrap();
        create_test_files(dir.path());

        let found = FileSelector::new()
            .include("Tests/**")
            .collect(dir.path())
            .unwrap();
        assert_eq!(found.paths.len(), 3);
    }

    #[test]
    fn test_paths_sorted() {
        let dir = TempDir::new().unwrap();
        create_test_files(dir.path());

        let found = FileSelector::new().extension("cs").collect(dir.path()).unwrap();
        let mut sorted = found.paths.clone();
        sorted.sort();
        assert_eq!(found.paths, sorted);
    }

    #[test]
    fn test_marker_precheck() {
        let selector = FileSelector::new().markers([".Should()", ".Assert."]);
        assert!(selector.admits("x.Should().Be(1);"));
        assert!(selector.admits("actor.Assert.Contains(a, b);"));
        assert!(!selector.admits("Assert.Equal(1, x);"));
        assert!(FileSelector::new().admits("anything"));
    }

    #[test]
    fn test_invalid_glob_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(FileSelector::new().exclude("a[").collect(dir.path()).is_err());
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let found = FileSelector::new().collect(dir.path()).unwrap();
        assert!(found.paths.is_empty());
    }
}
