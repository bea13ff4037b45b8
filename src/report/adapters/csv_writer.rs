//! CSV report destination on the local filesystem.
//!
//! Reports land under `{root}/{organization}[/{period}]/{stem}.csv`. The
//! default [`WriteMode::Overwrite`] writes into a temporary sibling file,
//! syncs it and renames it over the target, so an interrupted run never
//! leaves a partial report behind.

use crate::report::domain::{OrganizationId, ReportRow, ReportingPeriod};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, File, OpenOptions};
use std::io::{self, Write};
use thiserror::Error;
use uuid::Uuid;

/// Extension given to report files.
pub const REPORT_EXTENSION: &str = "csv";

/// How an existing report file is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the file atomically.
    #[default]
    Overwrite,
    /// Append rows, writing the header only into a new or empty file.
    Append,
}

/// Errors raised while writing report output.
#[derive(Debug, Error)]
pub enum ReportWriteError {
    /// A filesystem operation failed.
    #[error("filesystem error at {path}: {source}")]
    Io {
        /// Path being written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// CSV encoding failed.
    #[error("CSV encoding failed for {path}: {source}")]
    Csv {
        /// Path being written.
        path: Utf8PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// The target path has no file name component.
    #[error("report path {0} has no file name")]
    MissingFileName(Utf8PathBuf),
}

impl ReportWriteError {
    fn io(path: &Utf8Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source,
        }
    }

    fn csv(path: &Utf8Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_owned(),
            source,
        }
    }
}

/// Result type for report writes.
pub type ReportWriteResult<T> = Result<T, ReportWriteError>;

/// Root directory that receives report files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDestination {
    root: Utf8PathBuf,
}

impl ReportDestination {
    /// Creates a destination rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Path of a report relative to the root.
    #[must_use]
    pub fn relative_path(
        organization: OrganizationId,
        period: Option<&ReportingPeriod>,
        stem: &str,
    ) -> Utf8PathBuf {
        let mut path = Utf8PathBuf::from(organization.to_string());
        if let Some(month) = period {
            path.push(month.label());
        }
        path.push(format!("{stem}.{REPORT_EXTENSION}"));
        path
    }

    /// Absolute location of a relative report path.
    #[must_use]
    pub fn resolve(&self, relative: &Utf8Path) -> Utf8PathBuf {
        self.root.join(relative)
    }

    /// Writes `headers` and `rows` to `relative` under the root.
    ///
    /// Rows are written in slice order.
    ///
    /// # Errors
    ///
    /// Returns [`ReportWriteError`] when directories cannot be created or
    /// the file cannot be written, synced or renamed.
    pub fn write_report(
        &self,
        relative: &Utf8Path,
        headers: &[&str],
        rows: &[ReportRow],
        mode: WriteMode,
    ) -> ReportWriteResult<Utf8PathBuf> {
        let target = self.resolve(relative);
        let (dir, file_name) = self.open_parent(relative)?;
        match mode {
            WriteMode::Overwrite => {
                replace_file(&dir, file_name, &target, |file| {
                    encode(file, Some(headers), rows, &target)
                })?;
            }
            WriteMode::Append => {
                let mut options = OpenOptions::new();
                options.create(true).append(true);
                let file = dir
                    .open_with(file_name, &options)
                    .map_err(|err| ReportWriteError::io(&target, err))?;
                let existing = file
                    .metadata()
                    .map_err(|err| ReportWriteError::io(&target, err))?
                    .len();
                let header = (existing == 0).then_some(headers);
                let written = encode(file, header, rows, &target)?;
                written
                    .sync_all()
                    .map_err(|err| ReportWriteError::io(&target, err))?;
            }
        }
        Ok(target)
    }

    /// Atomically replaces `relative` with `contents`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportWriteError::Io`] when the file cannot be written.
    pub fn write_document(
        &self,
        relative: &Utf8Path,
        contents: &[u8],
    ) -> ReportWriteResult<Utf8PathBuf> {
        let target = self.resolve(relative);
        let (dir, file_name) = self.open_parent(relative)?;
        replace_file(&dir, file_name, &target, |mut file| {
            file.write_all(contents)
                .map_err(|err| ReportWriteError::io(&target, err))?;
            Ok(file)
        })?;
        Ok(target)
    }

    fn open_parent<'a>(&self, relative: &'a Utf8Path) -> ReportWriteResult<(Dir, &'a str)> {
        let file_name = relative
            .file_name()
            .ok_or_else(|| ReportWriteError::MissingFileName(relative.to_owned()))?;
        Dir::create_ambient_dir_all(&self.root, ambient_authority())
            .map_err(|err| ReportWriteError::io(&self.root, err))?;
        let root = Dir::open_ambient_dir(&self.root, ambient_authority())
            .map_err(|err| ReportWriteError::io(&self.root, err))?;
        let dir = match relative.parent().filter(|parent| !parent.as_str().is_empty()) {
            Some(parent) => {
                root.create_dir_all(parent)
                    .map_err(|err| ReportWriteError::io(&self.resolve(parent), err))?;
                root.open_dir(parent)
                    .map_err(|err| ReportWriteError::io(&self.resolve(parent), err))?
            }
            None => root,
        };
        Ok((dir, file_name))
    }
}

/// Writes through a temporary sibling and renames it over `file_name`.
fn replace_file<F>(dir: &Dir, file_name: &str, target: &Utf8Path, fill: F) -> ReportWriteResult<()>
where
    F: FnOnce(File) -> ReportWriteResult<File>,
{
    let temp_name = format!(".{file_name}.{}.tmp", Uuid::new_v4().simple());
    let outcome = dir
        .create(&temp_name)
        .map_err(|err| ReportWriteError::io(target, err))
        .and_then(fill)
        .and_then(|file| {
            file.sync_all()
                .map_err(|err| ReportWriteError::io(target, err))
        })
        .and_then(|()| {
            dir.rename(&temp_name, dir, file_name)
                .map_err(|err| ReportWriteError::io(target, err))
        });
    if outcome.is_err() {
        // Best-effort cleanup; the write error is returned.
        dir.remove_file(&temp_name).ok();
    }
    outcome
}

/// Encodes an optional header and the rows, returning the flushed file.
fn encode(
    file: File,
    headers: Option<&[&str]>,
    rows: &[ReportRow],
    target: &Utf8Path,
) -> ReportWriteResult<File> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if let Some(names) = headers {
        writer
            .write_record(names)
            .map_err(|err| ReportWriteError::csv(target, err))?;
    }
    for row in rows {
        writer
            .write_record(row.values())
            .map_err(|err| ReportWriteError::csv(target, err))?;
    }
    writer
        .into_inner()
        .map_err(|err| ReportWriteError::io(target, err.into_error()))
}
