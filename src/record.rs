//! In-memory file buffers and their write-back.

use crate::error::Result;
use std::fs;
use std::path::PathBuf;

/// A path plus its text, as read and as rewritten.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub original: String,
    pub text: String,
}

impl FileRecord {
    /// Reads the file fully; the handle is closed before this returns.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let original = fs::read_to_string(&path)?;
        Ok(Self {
            text: original.clone(),
            original,
            path,
        })
    }

    /// Returns true if the content was modified.
    pub fn is_modified(&self) -> bool {
        self.original != self.text
    }

    /// Path of the backup copy for `suffix`, e.g. `Foo.cs.bak`.
    pub fn backup_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Writes the rewritten text back if it changed, optionally saving the
    /// original alongside first. Returns the backup path when one was made.
    ///
    /// There is no partial-write recovery: a failure mid-write leaves the
    /// file in whatever state the OS left it.
    pub fn write(&self, backup_suffix: Option<&str>) -> Result<Option<PathBuf>> {
        if !self.is_modified() {
            return Ok(None);
        }
        let backup = match backup_suffix {
            Some(suffix) => {
                let backup = self.backup_path(suffix);
                fs::write(&backup, &self.original)?;
                Some(backup)
            }
            None => None,
        };
        fs::write(&self.path, &self.text)?;
        Ok(backup)
    }
}
