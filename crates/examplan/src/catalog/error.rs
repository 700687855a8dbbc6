//! Reasons a catalog row is skipped.

use thiserror::Error;

/// A source row that could not contribute to any exam.
///
/// None of these abort a parse; they are collected in the
/// [`ParseReport`](super::ParseReport) and logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Row starts a new entry but has no course code
    #[error("row {row}: missing course code")]
    MissingCourse { row: u64 },

    /// Row has a course but no start time
    #[error("row {row}: missing start time for {course}")]
    MissingStartTime { row: u64, course: String },

    /// Location-only row with no entry to extend
    #[error("row {row}: continuation row without a preceding exam")]
    OrphanContinuation { row: u64 },

    /// The CSV reader rejected the record outright
    #[error("row {row}: unreadable record: {message}")]
    Unreadable { row: u64, message: String },
}

impl RowError {
    /// Physical line the error refers to.
    pub fn row(&self) -> u64 {
        match self {
            RowError::MissingCourse { row }
            | RowError::MissingStartTime { row, .. }
            | RowError::OrphanContinuation { row }
            | RowError::Unreadable { row, .. } => *row,
        }
    }
}
