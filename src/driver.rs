//! File driver: apply a text transform to each target file, write back what
//! changed, and tally a run summary.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::{LinkifyOutcome, Rewrite};

/// Result of running one transform over one file.
#[derive(Debug)]
pub struct FileReport<T> {
    /// What the transform produced.
    pub outcome: T,
    /// The file that was processed.
    pub path: PathBuf,
    /// Whether the file was overwritten.
    pub written: bool,
}

impl<T: Outcome> FileReport<T> {
    /// Display name for report lines.
    pub fn name(&self) -> String {
        return display_name(&self.path);
    }
}

/// Output of a text transform the driver can write back and count.
pub trait Outcome {
    /// The transformed buffer.
    fn text(&self) -> &str;
    /// How many replacements the transform made.
    fn total(&self) -> usize;
}

impl Outcome for LinkifyOutcome {
    fn text(&self) -> &str {
        return &self.text;
    }

    fn total(&self) -> usize {
        return LinkifyOutcome::total(self);
    }
}

impl Outcome for Rewrite {
    fn text(&self) -> &str {
        return &self.text;
    }

    fn total(&self) -> usize {
        return self.count;
    }
}

/// Aggregate counts for a whole run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Files that had at least one replacement.
    pub files_changed: usize,
    /// Files read.
    pub files_scanned: usize,
    /// Replacements across all files.
    pub replacements: usize,
}

impl RunSummary {
    /// Fold one file's report into the summary.
    pub fn record<T: Outcome>(&mut self, report: &FileReport<T>) {
        let total = report.outcome.total();
        self.files_scanned = self.files_scanned.saturating_add(1);
        self.replacements = self.replacements.saturating_add(total);
        if total > 0 {
            self.files_changed = self.files_changed.saturating_add(1);
        }
    }
}

/// File name for report lines, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    return path
        .file_name()
        .map_or_else(|| return path.display().to_string(), |n| return n.to_string_lossy().into_owned());
}

/// Read `path`, apply `transform`, and overwrite the file when something
/// changed and this is not a dry run.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read or written, or
/// `Error::PersistFailed` if the rewritten file cannot replace the original.
pub fn process_file<T, F>(path: &Path, dry_run: bool, transform: F) -> Result<FileReport<T>, Error>
where
    T: Outcome,
    F: Fn(&str) -> T,
{
    let original = std::fs::read_to_string(path)?;
    let outcome = transform(&original);

    let written = outcome.total() > 0 && !dry_run;
    if written {
        write_atomic(path, outcome.text().as_bytes())?;
    }

    return Ok(FileReport {
        outcome,
        path: path.to_path_buf(),
        written,
    });
}

/// Replace `path` with `contents` via a temporary file in the same directory,
/// so a failed write leaves the original untouched. Keeps the original permissions.
///
/// # Errors
///
/// Returns `Error::Io` for temp-file creation or write failures, or
/// `Error::PersistFailed` if the final rename fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Error> {
    let dir = path
        .parent()
        .filter(|p| return !p.as_os_str().is_empty())
        .unwrap_or_else(|| return Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }

    tmp.persist(path).map_err(|e| {
        return Error::PersistFailed {
            path: path.to_path_buf(),
            reason: e.error.to_string(),
        };
    })?;
    return Ok(());
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    /// Uppercase everything, counting one replacement per changed buffer.
    fn shout(text: &str) -> Rewrite {
        let upper = text.to_uppercase();
        let count = usize::from(upper != text);
        return Rewrite { count, text: upper };
    }

    #[test]
    fn writes_back_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "hello").unwrap();

        let report = process_file(&path, false, shout).unwrap();
        assert!(report.written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "HELLO");
        assert_eq!(report.name(), "a.md");
    }

    #[test]
    fn dry_run_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "hello").unwrap();

        let report = process_file(&path, true, shout).unwrap();
        assert!(!report.written);
        assert_eq!(report.outcome.count, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn unchanged_file_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "HELLO").unwrap();

        let report = process_file(&path, false, shout).unwrap();
        assert!(!report.written);
    }

    #[test]
    fn summary_counts_files_and_replacements() {
        let mut summary = RunSummary::default();
        let changed = FileReport {
            outcome: Rewrite { count: 3, text: String::new() },
            path: PathBuf::from("a.md"),
            written: true,
        };
        let unchanged = FileReport {
            outcome: Rewrite { count: 0, text: String::new() },
            path: PathBuf::from("b.md"),
            written: false,
        };
        summary.record(&changed);
        summary.record(&unchanged);
        assert_eq!(summary, RunSummary { files_changed: 1, files_scanned: 2, replacements: 3 });
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = process_file(&dir.path().join("nope.md"), false, shout);
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
