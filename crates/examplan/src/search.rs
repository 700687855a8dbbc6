/// Course search over the exam catalog
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::ExamRecord;

/// Term tag treated as current when nothing else is configured.
pub const DEFAULT_CURRENT_TERM: &str = "W2026";

/// Which half of the catalog a search looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Current,
    Historical,
}

/// Splits the catalog into current and historical exams by term tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermPartition {
    current_terms: BTreeSet<String>,
}

impl TermPartition {
    pub fn new<I, S>(current_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            current_terms: current_terms
                .into_iter()
                .map(|t| Into::<String>::into(t).trim().to_string())
                .collect(),
        }
    }

    pub fn is_current(&self, year: &str) -> bool {
        self.current_terms.contains(year)
    }

    /// Returns true if an exam from `year` belongs in `mode`.
    pub fn matches(&self, year: &str, mode: ViewMode) -> bool {
        match mode {
            ViewMode::Current => self.is_current(year),
            ViewMode::Historical => !self.is_current(year),
        }
    }

    pub fn current_terms(&self) -> impl Iterator<Item = &str> {
        self.current_terms.iter().map(String::as_str)
    }
}

impl Default for TermPartition {
    fn default() -> Self {
        Self::new([DEFAULT_CURRENT_TERM])
    }
}

/// Splits a comma-separated query into uppercased, non-empty terms.
pub fn search_terms(query: &str) -> Vec<String> {
    query
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Finds exams whose course code contains any of the query terms.
///
/// A blank query matches nothing. Results keep catalog order.
pub fn search<'a>(
    exams: &'a [ExamRecord],
    query: &str,
    mode: ViewMode,
    partition: &TermPartition,
) -> Vec<&'a ExamRecord> {
    let terms = search_terms(query);
    if terms.is_empty() {
        return Vec::new();
    }

    exams
        .iter()
        .filter(|exam| {
            let course = exam.course.to_uppercase();
            terms.iter().any(|term| course.contains(term.as_str()))
        })
        .filter(|exam| partition.matches(&exam.year, mode))
        .collect()
}
