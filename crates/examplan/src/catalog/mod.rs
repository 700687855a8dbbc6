/// Exam catalog parsing module
mod error;
mod id;
mod types;

pub use error::RowError;
pub use id::ExamId;
pub use types::*;

use chrono::NaiveTime;
use csv::StringRecord;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info};

// Column layout shared by both exports; `current` adds the title at the end.
const COL_COURSE: usize = 0;
const COL_SECTION: usize = 1;
const COL_YEAR: usize = 2;
const COL_EXAM_TYPE: usize = 3;
const COL_START: usize = 4;
const COL_END: usize = 5;
const COL_BUILDING: usize = 6;
const COL_ROOM: usize = 7;
const COL_TITLE: usize = 8;

const HEADER_LABELS: &[&str] = &["course", "course code", "course_code"];

static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2})\s*[:h]\s*(\d{2})\s*(?:([ap])\.?\s*m\.?)?$").unwrap()
});

/// Result of parsing one block of catalog text.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub records: Vec<ExamRecord>,
    pub skipped: Vec<RowError>,
}

/// Parses a block of catalog text into exam records.
///
/// Best effort: rows that cannot produce an exam are dropped and parsing
/// continues. Records come back in input order.
pub fn parse(raw: &str, kind: SourceKind) -> Vec<ExamRecord> {
    parse_with_report(raw, kind).records
}

/// Same as [`parse`], but also returns every skipped row with its reason.
pub fn parse_with_report(raw: &str, kind: SourceKind) -> ParseReport {
    let mut report = ParseReport::default();
    let mut open: Option<PendingExam> = None;

    for (idx, text) in raw.lines().enumerate() {
        let line = idx as u64 + 1;
        if text.trim().is_empty() {
            continue;
        }

        let record = match split_fields(text) {
            Ok(record) => record,
            Err(e) => {
                debug!(row = line, source = %kind, "Skipping unreadable catalog record: {}", e);
                if let Some(pending) = open.take() {
                    report.records.push(pending.finish());
                }
                report.skipped.push(RowError::Unreadable {
                    row: line,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let row = RawRow::from_record(&record, kind);

        if row.is_blank() {
            continue;
        }

        if row.is_header() {
            debug!(row = line, source = %kind, "Skipping header line");
            continue;
        }

        if row.is_continuation() {
            match open.as_mut() {
                Some(pending) => pending.push_location(row.building, row.room, line),
                None => {
                    let err = RowError::OrphanContinuation { row: line };
                    debug!(source = %kind, "{}", err);
                    report.skipped.push(err);
                }
            }
            continue;
        }

        if let Some(pending) = open.take() {
            report.records.push(pending.finish());
        }

        match PendingExam::start(row, line) {
            Ok(pending) => open = Some(pending),
            Err(err) => {
                debug!(source = %kind, "{}", err);
                report.skipped.push(err);
            }
        }
    }

    if let Some(pending) = open.take() {
        report.records.push(pending.finish());
    }

    info!(
        source = %kind,
        records = report.records.len(),
        skipped = report.skipped.len(),
        "Parsed exam catalog"
    );

    report
}

/// Splits one physical line into trimmed, quote-aware cells.
fn split_fields(line: &str) -> Result<StringRecord, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    reader.read_record(&mut record)?;
    Ok(record)
}

/// Normalizes a time cell to 24-hour `HH:MM`.
///
/// Text that does not look like a time is returned trimmed but otherwise
/// untouched.
pub fn normalize_time(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(caps) = TIME_REGEX.captures(trimmed) else {
        return trimmed.to_string();
    };

    let hour: u32 = caps[1].parse().unwrap_or(99);
    let minute: u32 = caps[2].parse().unwrap_or(99);
    let hour = match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(_) if hour == 0 || hour > 12 => return trimmed.to_string(),
        Some(meridiem) if meridiem == "p" && hour != 12 => hour + 12,
        Some(meridiem) if meridiem == "a" && hour == 12 => 0,
        _ => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Cells of one physical row, already trimmed.
struct RawRow {
    course: String,
    section: String,
    year: String,
    exam_type: String,
    start_time: String,
    end_time: String,
    building: String,
    room: String,
    course_title: String,
}

impl RawRow {
    fn from_record(record: &StringRecord, kind: SourceKind) -> Self {
        if let Some(row) = Self::short_continuation(record) {
            return row;
        }

        let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();

        Self {
            course: cell(COL_COURSE),
            section: cell(COL_SECTION),
            year: cell(COL_YEAR),
            exam_type: cell(COL_EXAM_TYPE),
            start_time: cell(COL_START),
            end_time: cell(COL_END),
            building: cell(COL_BUILDING),
            room: cell(COL_ROOM),
            course_title: if kind.has_title_column() {
                // An unquoted title may itself have been split on commas
                record
                    .iter()
                    .skip(COL_TITLE)
                    .filter(|c| !c.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                String::new()
            },
        }
    }

    /// Reads a location-only row written without the leading exam columns,
    /// such as `,,BuildingA,Room2`.
    ///
    /// Only rows that stop short of the room column with blank course and
    /// section qualify, and only if at most two cells carry text. The last
    /// of those is the room; the one before it is the building.
    fn short_continuation(record: &StringRecord) -> Option<Self> {
        if record.len() > COL_ROOM {
            return None;
        }
        let blank = |idx: usize| record.get(idx).map_or(true, str::is_empty);
        if !blank(COL_COURSE) || !blank(COL_SECTION) {
            return None;
        }

        let filled: Vec<&str> = record.iter().filter(|c| !c.is_empty()).collect();
        let (building, room) = match filled.as_slice() {
            [room] => ("", *room),
            [building, room] => (*building, *room),
            _ => return None,
        };

        Some(Self {
            course: String::new(),
            section: String::new(),
            year: String::new(),
            exam_type: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            building: building.to_string(),
            room: room.to_string(),
            course_title: String::new(),
        })
    }

    fn is_blank(&self) -> bool {
        [
            &self.course,
            &self.section,
            &self.year,
            &self.exam_type,
            &self.start_time,
            &self.end_time,
            &self.building,
            &self.room,
            &self.course_title,
        ]
        .iter()
        .all(|cell| cell.is_empty())
    }

    fn is_header(&self) -> bool {
        let first = self.course.to_lowercase();
        HEADER_LABELS.contains(&first.as_str())
    }

    /// Course, section and times blank while a location is present.
    fn is_continuation(&self) -> bool {
        self.course.is_empty()
            && self.section.is_empty()
            && self.start_time.is_empty()
            && self.end_time.is_empty()
            && (!self.building.is_empty() || !self.room.is_empty())
    }
}

/// An exam whose rows are still being folded in.
struct PendingExam {
    course: String,
    section: String,
    year: String,
    exam_type: String,
    start_time: String,
    end_time: String,
    locations: Vec<ExamLocation>,
    row_span: RowSpan,
    course_title: String,
}

impl PendingExam {
    fn start(row: RawRow, line: u64) -> Result<Self, RowError> {
        if row.course.is_empty() {
            return Err(RowError::MissingCourse { row: line });
        }
        let course = row.course.to_uppercase();
        if row.start_time.is_empty() {
            return Err(RowError::MissingStartTime { row: line, course });
        }

        let mut pending = Self {
            course,
            section: row.section,
            year: row.year,
            exam_type: row.exam_type,
            start_time: normalize_time(&row.start_time),
            end_time: normalize_time(&row.end_time),
            locations: Vec::new(),
            row_span: RowSpan::single(line),
            course_title: row.course_title,
        };
        pending.add_location(row.building, row.room);
        Ok(pending)
    }

    fn push_location(&mut self, building: String, room: String, line: u64) {
        // A bare room on a continuation row stays in the previous building
        let building = if building.is_empty() {
            self.locations
                .last()
                .map(|l| l.building.clone())
                .unwrap_or_default()
        } else {
            building
        };
        self.add_location(building, room);
        self.row_span.extend(line);
    }

    fn add_location(&mut self, building: String, room: String) {
        if building.is_empty() && room.is_empty() {
            return;
        }
        let location = ExamLocation { building, room };
        if !self.locations.contains(&location) {
            self.locations.push(location);
        }
    }

    fn finish(self) -> ExamRecord {
        let mut record = ExamRecord {
            id: ExamId::from_raw(""),
            course: self.course,
            section: self.section,
            year: self.year,
            exam_type: self.exam_type,
            start_time: self.start_time,
            end_time: self.end_time,
            locations: self.locations,
            row_span: self.row_span,
            course_title: self.course_title,
        };
        record.id = record.derived_id();
        record
    }
}

/// The searchable universe of exams, current term first.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    exams: Vec<ExamRecord>,
    index: HashMap<ExamId, usize>,
}

impl Catalog {
    /// Parses both catalog exports and concatenates them.
    pub fn load(current: &str, historical: &str) -> Self {
        let current_exams = parse(current, SourceKind::Current);
        let historical_exams = parse(historical, SourceKind::Historical);

        info!(
            "Parsed {} current exams and {} historical exams ({} total)",
            current_exams.len(),
            historical_exams.len(),
            current_exams.len() + historical_exams.len()
        );

        let mut exams = current_exams;
        exams.extend(historical_exams);
        Self::from_records(exams)
    }

    /// Builds a catalog from already-parsed records.
    ///
    /// Records sharing an id stay in the list; lookups return the first.
    pub fn from_records(exams: Vec<ExamRecord>) -> Self {
        let mut index = HashMap::with_capacity(exams.len());
        for (pos, exam) in exams.iter().enumerate() {
            index.entry(exam.id.clone()).or_insert(pos);
        }
        Self { exams, index }
    }

    pub fn exams(&self) -> &[ExamRecord] {
        &self.exams
    }

    /// Looks up an exam by identifier.
    pub fn get(&self, id: &ExamId) -> Option<&ExamRecord> {
        self.index.get(id).map(|&pos| &self.exams[pos])
    }

    pub fn len(&self) -> usize {
        self.exams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }
}
