//! The user's exam schedule and its persistence.
mod reconciler;
pub mod store;

pub use reconciler::{PersistOutcome, ReconcilerState, ScheduleReconciler};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::account::AccountError;
use crate::catalog::{ExamId, ExamRecord};
use store::StoreError;

/// Ordered selection of exams, at most one entry per identifier.
///
/// Order is the order the user picked them in. Serializes as a plain JSON
/// array of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule(Vec<ExamRecord>);

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schedule, keeping the first of any records sharing an id.
    pub fn from_records(records: impl IntoIterator<Item = ExamRecord>) -> Self {
        let mut schedule = Self::new();
        for record in records {
            if !schedule.contains(&record.id) {
                schedule.0.push(record);
            }
        }
        schedule
    }

    /// Removes the exam if it is already scheduled, otherwise appends it.
    ///
    /// Returns true if the exam was added.
    pub fn toggle(&mut self, record: ExamRecord) -> bool {
        if self.remove(&record.id) {
            false
        } else {
            self.0.push(record);
            true
        }
    }

    /// Removes the exam with this id. Returns false if it wasn't there.
    pub fn remove(&mut self, id: &ExamId) -> bool {
        let before = self.0.len();
        self.0.retain(|e| &e.id != id);
        self.0.len() != before
    }

    pub fn contains(&self, id: &ExamId) -> bool {
        self.0.iter().any(|e| &e.id == id)
    }

    pub fn exams(&self) -> &[ExamRecord] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExamRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Re-derives every identifier and drops duplicates that result.
    ///
    /// Stored schedules may have been written by an older build, so loads go
    /// through here before the schedule becomes authoritative.
    pub fn rebuilt(self) -> Self {
        let records = self.0.into_iter().map(|record| {
            let derived = record.derived_id();
            if derived != record.id {
                debug!(stored = %record.id, derived = %derived, "Correcting stored exam id");
            }
            record.rekeyed()
        });
        Self::from_records(records)
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a ExamRecord;
    type IntoIter = std::slice::Iter<'a, ExamRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Errors from reconciling the schedule with its stores.
///
/// None of these are fatal: the in-memory schedule is kept either way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Local storage held something that isn't a schedule
    #[error("Stored schedule is corrupt: {message}")]
    StorageCorrupt { message: String },

    /// Writing the guest schedule to local storage failed
    #[error("Failed to save schedule locally: {0}")]
    LocalPersist(#[from] StoreError),

    /// The account service rejected the schedule update
    #[error("Failed to save schedule to account: {0}")]
    RemotePersist(#[source] AccountError),
}

impl ReconcileError {
    /// Returns true if a later write may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcileError::StorageCorrupt { .. } => false,
            ReconcileError::LocalPersist(_) => true,
            ReconcileError::RemotePersist(e) => e.is_retryable(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::{parse, SourceKind};

    pub(crate) fn sample_exams() -> Vec<ExamRecord> {
        parse(
            "\
COMP202,1,W2026,Final,09:00,12:00,ENGMC,304
MATH133,1,W2026,Final,14:00,17:00,Leacock,132
PHYS101,1,W2026,Final,09:00,12:00,Rutherford,112
",
            SourceKind::Historical,
        )
    }

    #[test]
    fn test_toggle_twice_is_a_no_op() {
        let exam = sample_exams().remove(0);
        let mut schedule = Schedule::new();

        assert!(schedule.toggle(exam.clone()));
        assert_eq!(schedule.exams(), &[exam.clone()]);

        assert!(!schedule.toggle(exam));
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_retoggle_appends_at_end() {
        let exams = sample_exams();
        let mut schedule = Schedule::from_records(exams.clone());

        schedule.toggle(exams[0].clone());
        schedule.toggle(exams[0].clone());

        let order: Vec<&str> = schedule.iter().map(|e| e.course.as_str()).collect();
        assert_eq!(order, vec!["MATH133", "PHYS101", "COMP202"]);
    }

    #[test]
    fn test_remove_keeps_order_and_ignores_unknown_ids() {
        let exams = sample_exams();
        let mut schedule = Schedule::from_records(exams.clone());

        assert!(schedule.remove(&exams[1].id));
        assert!(!schedule.remove(&exams[1].id));
        assert!(!schedule.remove(&ExamId::from_raw("nope")));

        let order: Vec<&str> = schedule.iter().map(|e| e.course.as_str()).collect();
        assert_eq!(order, vec!["COMP202", "PHYS101"]);
    }

    #[test]
    fn test_no_duplicate_ids_under_mixed_operations() {
        let exams = sample_exams();
        let mut schedule = Schedule::new();

        // Deterministic pseudo-random walk over toggles and removes
        let mut seed: u32 = 7;
        for _ in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let exam = &exams[(seed >> 16) as usize % exams.len()];
            if (seed >> 8) % 3 == 0 {
                schedule.remove(&exam.id);
            } else {
                schedule.toggle(exam.clone());
            }

            let mut ids: Vec<&ExamId> = schedule.iter().map(|e| &e.id).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), schedule.len());
        }
    }

    #[test]
    fn test_from_records_keeps_first_duplicate() {
        let exams = sample_exams();
        let schedule = Schedule::from_records(vec![
            exams[0].clone(),
            exams[1].clone(),
            exams[0].clone(),
        ]);
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn test_rebuilt_corrects_stale_ids() {
        let mut stale = sample_exams().remove(0);
        let expected = stale.id.clone();
        stale.id = ExamId::from_raw("legacy-1");

        let rebuilt = Schedule::from_records(vec![stale]).rebuilt();

        assert_eq!(rebuilt.exams()[0].id, expected);
    }

    #[test]
    fn test_serializes_as_array() {
        let schedule = Schedule::from_records(sample_exams());
        let json = serde_json::to_value(&schedule).unwrap();

        assert!(json.is_array());
        let back: Schedule = serde_json::from_value(json).unwrap();
        assert_eq!(back, schedule);
    }
}
