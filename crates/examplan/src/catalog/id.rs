//! Stable exam identifiers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifier shared by every copy of the same exam, no matter which catalog
/// load or which store it came from.
///
/// Derived from the normalized course, section, year, exam type, start time
/// and room, so re-parsing identical text yields identical ids.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(String);

impl ExamId {
    /// Derives the identifier from the key fields of an exam.
    ///
    /// All inputs are trimmed and the course is uppercased before hashing.
    /// This is the only place ids are computed; the parser and the storage
    /// rebuild path both go through it.
    pub fn derive(
        course: &str,
        section: &str,
        year: &str,
        exam_type: &str,
        start_time: &str,
        room: &str,
    ) -> Self {
        let course = course.trim().to_uppercase();

        let mut hasher = Sha256::new();
        for field in [
            course.as_str(),
            section.trim(),
            year.trim(),
            exam_type.trim(),
            start_time.trim(),
            room.trim(),
        ] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();

        let compact: String = course.chars().filter(|c| !c.is_whitespace()).collect();
        Self(format!("{}-{}", compact, hex::encode(&digest[..12])))
    }

    /// Wraps an identifier read back from storage without validating it.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = ExamId::derive("COMP202", "1", "W2026", "Final", "09:00", "Room1");
        let b = ExamId::derive("COMP202", "1", "W2026", "Final", "09:00", "Room1");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("COMP202-"));
    }

    #[test]
    fn test_derive_normalizes_course_case_and_padding() {
        let a = ExamId::derive("comp202 ", "1", "W2026", "Final", "09:00", "Room1");
        let b = ExamId::derive("COMP202", " 1", "W2026", "Final", "09:00", "Room1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_distinguishes_key_fields() {
        let base = ExamId::derive("COMP202", "1", "W2026", "Final", "09:00", "Room1");
        assert_ne!(base, ExamId::derive("COMP202", "2", "W2026", "Final", "09:00", "Room1"));
        assert_ne!(base, ExamId::derive("COMP202", "1", "W2025", "Final", "09:00", "Room1"));
        assert_ne!(base, ExamId::derive("COMP202", "1", "W2026", "Midterm", "09:00", "Room1"));
        assert_ne!(base, ExamId::derive("COMP202", "1", "W2026", "Final", "14:00", "Room1"));
        assert_ne!(base, ExamId::derive("COMP202", "1", "W2026", "Final", "09:00", "Room2"));
    }

    #[test]
    fn test_field_boundaries_do_not_collide() {
        let a = ExamId::derive("COMP202", "11", "W2026", "Final", "09:00", "R");
        let b = ExamId::derive("COMP202", "1", "1W2026", "Final", "09:00", "R");
        assert_ne!(a, b);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ExamId::from_raw("COMP202-abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"COMP202-abc\"");
    }
}
