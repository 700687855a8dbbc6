/// Types for parsed exam catalog data
use serde::{Deserialize, Serialize};

use super::id::ExamId;

/// Which export a block of catalog text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Current-term export, with a trailing course title column
    Current,
    /// Older exports, no course title
    Historical,
}

impl SourceKind {
    /// Returns true if rows of this kind may carry a course title column.
    pub fn has_title_column(&self) -> bool {
        matches!(self, SourceKind::Current)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Current => f.write_str("current"),
            SourceKind::Historical => f.write_str("historical"),
        }
    }
}

/// One place an exam is written (e.g. `ENGMC`, `Room 304`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExamLocation {
    pub building: String,
    pub room: String,
}

/// Physical source rows that were folded into one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSpan {
    /// 1-based line numbers, in input order
    pub rows: Vec<u64>,
    pub first: u64,
    pub last: u64,
}

impl RowSpan {
    pub fn single(row: u64) -> Self {
        Self {
            rows: vec![row],
            first: row,
            last: row,
        }
    }

    pub fn extend(&mut self, row: u64) {
        self.rows.push(row);
        self.last = row;
    }
}

/// A single scheduled exam occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub id: ExamId,
    /// Uppercased course code, e.g. `COMP202`
    pub course: String,
    pub section: String,
    /// Term tag, e.g. `W2026`
    pub year: String,
    pub exam_type: String,
    pub start_time: String,
    pub end_time: String,
    pub locations: Vec<ExamLocation>,
    pub row_span: RowSpan,
    #[serde(default)]
    pub course_title: String,
}

impl ExamRecord {
    /// Room component used for identity: every room joined in fold order.
    pub fn room_key(&self) -> String {
        self.locations
            .iter()
            .map(|l| l.room.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Recomputes the identifier from the current field values.
    pub fn derived_id(&self) -> ExamId {
        ExamId::derive(
            &self.course,
            &self.section,
            &self.year,
            &self.exam_type,
            &self.start_time,
            &self.room_key(),
        )
    }

    /// Returns the record with its identifier re-derived.
    ///
    /// Used when rebuilding schedules from storage, where the stored id may
    /// predate the current derivation.
    pub fn rekeyed(mut self) -> Self {
        self.id = self.derived_id();
        self
    }

    /// Distinct building names, in order of appearance.
    pub fn buildings(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for loc in &self.locations {
            if !loc.building.is_empty() && !out.contains(&loc.building.as_str()) {
                out.push(&loc.building);
            }
        }
        out
    }
}
