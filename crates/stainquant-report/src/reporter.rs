//! The accumulate-then-write contract shared by every report

use crate::ReportResult;
use std::fs;
use std::path::{Path, PathBuf};

/// A write-once table of per-image rows.
///
/// Rows are appended in processing order. [`Reporter::finalize`] consumes
/// the report, so a table is written at most once.
pub trait Reporter {
    /// One row of the table
    type Row;

    /// Append one row.
    fn append(&mut self, row: Self::Row) -> ReportResult<()>;

    /// Number of rows appended so far.
    fn len(&self) -> usize;

    /// True when no row has been appended.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reorder rows by image identifier.
    ///
    /// Only needed when rows are appended from several workers.
    fn sort_by_identifier(&mut self);

    /// Serialise the table.
    fn render(&self) -> String;

    /// Short name used in log lines.
    fn kind(&self) -> &'static str;

    /// Write the table to `path`.
    ///
    /// Returns `Ok(None)` without touching the filesystem when no row was
    /// appended, `Ok(Some(path))` after writing.
    fn finalize(self, path: &Path) -> ReportResult<Option<PathBuf>>
    where
        Self: Sized,
    {
        if self.is_empty() {
            tracing::info!(report = self.kind(), "no rows, nothing written");
            return Ok(None);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        tracing::info!(
            report = self.kind(),
            rows = self.len(),
            path = %path.display(),
            "report written"
        );
        Ok(Some(path.to_path_buf()))
    }
}
