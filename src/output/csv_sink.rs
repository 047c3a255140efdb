//! CSV output sink
//!
//! Rows are `author,title,body` with no header line, so row `n` of the file is
//! the `n`-th record ever written to it. Bodies contain newlines; the csv
//! crate quotes them, which is why rows are counted with a CSV reader rather
//! than by lines.

use crate::crawler::Record;
use crate::output::traits::{OutputCursor, OutputError, OutputResult, RecordSink};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Append-only CSV file of records
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    cursor: OutputCursor,
}

impl CsvSink {
    /// Opens the output, picking up after any rows already in it
    ///
    /// Nothing is created or written here; a missing file is created by the
    /// first [`append`](RecordSink::append).
    pub fn open(path: impl AsRef<Path>) -> OutputResult<Self> {
        let path = path.as_ref().to_path_buf();

        let existing_rows = if path.exists() {
            let rows = count_rows(&path)?;
            tracing::info!(
                "Output file {} exists with {} rows, appending",
                path.display(),
                rows
            );
            rows
        } else {
            tracing::info!("Output file {} does not exist, will create it", path.display());
            0
        };

        Ok(Self {
            path,
            cursor: OutputCursor::after_rows(existing_rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every row of a CSV output back as records
    pub fn read_records(path: impl AsRef<Path>) -> OutputResult<Vec<Record>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            records.push(Record::new(
                row.get(0).unwrap_or_default(),
                row.get(1).unwrap_or_default(),
                row.get(2).unwrap_or_default(),
            ));
        }
        Ok(records)
    }

    /// Writes the current file plus `records` to a temporary file next to the
    /// output, syncs it and renames it over the output
    ///
    /// The output keeps its permission bits. A symlinked output is replaced
    /// by a regular file; the link target is left as it was.
    fn persist_with(&self, records: &[Record]) -> OutputResult<()> {
        let existing = if self.path.exists() {
            Some(fs::metadata(&self.path)?)
        } else {
            None
        };

        let found = match existing {
            Some(_) => count_rows(&self.path)?,
            None => 0,
        };
        if found != self.cursor.rows_written() {
            return Err(OutputError::CursorMismatch {
                path: self.path.display().to_string(),
                expected: self.cursor.rows_written(),
                found,
            });
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;

        if let Some(metadata) = existing {
            let mut current = File::open(&self.path)?;
            io::copy(&mut current, staged.as_file_mut())?;
            staged.as_file().set_permissions(metadata.permissions())?;
        }

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(staged.as_file_mut());
            for record in records {
                writer.write_record([&record.author, &record.title, &record.body])?;
            }
            writer.flush()?;
        }

        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl RecordSink for CsvSink {
    fn append(&mut self, records: &[Record]) -> OutputResult<()> {
        if records.is_empty() {
            // keep open-or-create semantics even for an empty page
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            tracing::debug!("Empty batch, nothing written to {}", self.path.display());
            return Ok(());
        }

        let first_row = self.cursor.next_row();
        self.persist_with(records)?;
        for _ in records {
            self.cursor.advance();
        }

        tracing::info!(
            "Wrote rows {}..={} to {}",
            first_row,
            self.cursor.next_row() - 1,
            self.path.display()
        );
        Ok(())
    }

    fn cursor(&self) -> OutputCursor {
        self.cursor
    }
}

/// Number of CSV rows in an existing output file
fn count_rows(path: &Path) -> OutputResult<u64> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = 0;
    for row in reader.records() {
        row?;
        rows += 1;
    }
    Ok(rows)
}
