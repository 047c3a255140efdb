//! Output sink trait and types
//!
//! This module defines the trait interface for record sinks, the cursor that
//! tracks where the next row goes, and the errors a sink can report.

use crate::crawler::Record;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path} holds {found} rows but the cursor expects {expected}; it was changed by another writer")]
    CursorMismatch {
        path: String,
        expected: u64,
        found: u64,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Position of the next row to write, 1-based
///
/// Seeded once from the number of rows already in the output and only ever
/// moved forward, one step per written record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputCursor {
    next_row: u64,
}

impl OutputCursor {
    /// Cursor for an output that already holds `existing_rows` rows
    pub fn after_rows(existing_rows: u64) -> Self {
        Self {
            next_row: existing_rows + 1,
        }
    }

    /// Row index the next record will be written to
    pub fn next_row(&self) -> u64 {
        self.next_row
    }

    /// Rows written so far, including those from earlier runs
    pub fn rows_written(&self) -> u64 {
        self.next_row - 1
    }

    /// Moves past one written row
    pub fn advance(&mut self) {
        self.next_row += 1;
    }
}

impl Default for OutputCursor {
    fn default() -> Self {
        Self::after_rows(0)
    }
}

/// Durable, append-only destination for extracted records
///
/// Called once per page from a single task; implementations need no locking.
pub trait RecordSink {
    /// Writes the records as consecutive rows and persists them before
    /// returning. Either the whole batch becomes durable or none of it does.
    fn append(&mut self, records: &[Record]) -> OutputResult<()>;

    /// Where the next row will go
    fn cursor(&self) -> OutputCursor;
}
