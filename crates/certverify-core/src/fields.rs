//! Structured field extraction from certificate text
//!
//! Turns raw extracted or OCR text into candidate details (roll number and
//! names) and the list of subjects. The layout heuristic lives behind the
//! [`FieldParser`] trait so other certificate layouts can plug in without
//! touching the rest of the pipeline.

use lazy_static::lazy_static;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

lazy_static! {
    /// Header line that opens the subject table
    static ref SUBJECT_START_PATTERN: Regex = Regex::new(r"(?i)\bSUB CODE\b").unwrap();

    /// Line that closes the subject table
    static ref SUBJECT_END_PATTERN: Regex = Regex::new(r"(?i)\bResult\b").unwrap();

    /// Anything a printed name or roll number should never contain
    static ref UNEXPECTED_GLYPH_PATTERN: Regex = Regex::new(r"[^a-zA-Z0-9\s.&]").unwrap();
}

/// Label lines that precede the candidate value block
pub const CANDIDATE_LABELS: &[&str] = &[
    "Roll No",
    "Candidate Name",
    "Mother's Name",
    "Father's Name",
    "School's Name",
];

/// Column headers inside the subject table that are not subjects
pub const SUBJECT_TABLE_HEADERS: &[&str] = &["THEORY", "POSITIONAL", "GRADE", "Prac", "MARKS"];

/// Number of value lines following the last label
const VALUE_WINDOW: usize = 5;

/// Capability: derive [`ParsedFields`] from document text
pub trait FieldParser: Send + Sync {
    /// Parse text into fields. Must not fail; problems surface as
    /// `layout_issue` / `font_issue` flags.
    fn parse(&self, text: &str) -> ParsedFields;
}

/// Presence marker recorded for each subject line
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SubjectMarker {
    Present,
}

/// Subjects in document order, serialized as a JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectMap {
    entries: Vec<(String, SubjectMarker)>,
}

impl SubjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. A repeated subject keeps its first position.
    pub fn insert(&mut self, subject: impl Into<String>, marker: SubjectMarker) {
        let subject = subject.into();
        match self.entries.iter_mut().find(|(s, _)| *s == subject) {
            Some(entry) => entry.1 = marker,
            None => self.entries.push((subject, marker)),
        }
    }

    pub fn get(&self, subject: &str) -> Option<SubjectMarker> {
        self.entries
            .iter()
            .find(|(s, _)| s == subject)
            .map(|(_, marker)| *marker)
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.get(subject).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subject labels in document order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }
}

impl Serialize for SubjectMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (subject, marker) in &self.entries {
            map.serialize_entry(subject, marker)?;
        }
        map.end()
    }
}

/// Candidate and subject details read from a certificate
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ParsedFields {
    pub roll_no: Option<String>,
    pub candidate_name: Option<String>,
    pub mother_name: Option<String>,
    pub father_name: Option<String>,
    pub school_name: Option<String>,
    pub subjects: SubjectMap,
    /// The candidate value block could not be located
    pub layout_issue: bool,
    /// A critical field contains glyphs a genuine certificate would not print
    pub font_issue: bool,
}

impl ParsedFields {
    /// The five critical fields in fixed order
    pub fn critical_fields(&self) -> [Option<&str>; 5] {
        [
            self.roll_no.as_deref(),
            self.candidate_name.as_deref(),
            self.mother_name.as_deref(),
            self.father_name.as_deref(),
            self.school_name.as_deref(),
        ]
    }
}

/// The value window could not be formed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowError {
    NoLabel,
}

/// Parser for the single-column marksheet layout: a block of label lines
/// followed by the values in the same order, then a subject table between
/// "SUB CODE" and "Result".
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalFieldParser;

impl PositionalFieldParser {
    pub fn new() -> Self {
        Self
    }

    /// Split into trimmed, non-empty lines after normalizing line endings and
    /// non-breaking spaces
    pub fn normalize_lines(text: &str) -> Vec<String> {
        text.replace('\r', "\n")
            .replace('\u{00A0}', " ")
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Index of the last line containing any candidate label
    fn last_label_index(lines: &[String]) -> Option<usize> {
        let labels: Vec<String> = CANDIDATE_LABELS.iter().map(|l| l.to_lowercase()).collect();
        lines.iter().rposition(|line| {
            let lower = line.to_lowercase();
            labels.iter().any(|label| lower.contains(label.as_str()))
        })
    }

    fn value_window(
        lines: &[String],
        last_label: Option<usize>,
    ) -> Result<&[String], WindowError> {
        let idx = last_label.ok_or(WindowError::NoLabel)?;
        let start = (idx + 1).min(lines.len());
        let end = (start + VALUE_WINDOW).min(lines.len());
        Ok(&lines[start..end])
    }

    fn extract_subjects(lines: &[String]) -> SubjectMap {
        let mut subjects = SubjectMap::new();

        let start = lines.iter().position(|l| SUBJECT_START_PATTERN.is_match(l));
        let end = lines.iter().position(|l| SUBJECT_END_PATTERN.is_match(l));

        if let (Some(start), Some(end)) = (start, end) {
            if start < end {
                for line in &lines[start + 1..end] {
                    let is_header = SUBJECT_TABLE_HEADERS
                        .iter()
                        .any(|h| line.eq_ignore_ascii_case(h));
                    if is_header {
                        continue;
                    }
                    let subject = line.trim();
                    if !subject.is_empty() {
                        subjects.insert(subject, SubjectMarker::Present);
                    }
                }
            }
        }

        subjects
    }

    fn has_font_issue(fields: &ParsedFields) -> bool {
        let critical = fields
            .critical_fields()
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        UNEXPECTED_GLYPH_PATTERN.is_match(&critical)
    }
}

impl FieldParser for PositionalFieldParser {
    fn parse(&self, text: &str) -> ParsedFields {
        let lines = Self::normalize_lines(text);
        let mut fields = ParsedFields::default();

        match Self::value_window(&lines, Self::last_label_index(&lines)) {
            Ok(values) => {
                let mut values = values.iter().cloned();
                fields.roll_no = values.next();
                fields.candidate_name = values.next();
                fields.mother_name = values.next();
                fields.father_name = values.next();
                fields.school_name = values.next();
            }
            Err(WindowError::NoLabel) => {
                debug!(lines = lines.len(), "No candidate label found");
                fields.layout_issue = true;
            }
        }

        fields.subjects = Self::extract_subjects(&lines);
        fields.font_issue = Self::has_font_issue(&fields);
        fields
    }
}

/// Parse with the default positional layout
pub fn parse_details(text: &str) -> ParsedFields {
    PositionalFieldParser.parse(text)
}
