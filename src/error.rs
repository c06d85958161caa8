use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Missing '{0}' line in export")]
    MissingSetting(&'static str),

    #[error("Could not find any segments. You must define segment ends using Cxx commands")]
    NoSegmentsFound,

    #[error("Row {row:02X} of pattern {pattern:02X} is out of order")]
    OutOfOrderRow { pattern: usize, row: usize },

    #[error("Pattern {pattern:02X} appears after pattern {previous:02X}")]
    OutOfOrderPattern { previous: usize, pattern: usize },

    #[error("Segment {segment:02X}, row {row}: unknown noise note '{name}'")]
    UnknownNoiseNoteName {
        segment: usize,
        row: usize,
        name: String,
    },

    #[error("Segment {segment:02X}, row {row}: unknown note '{name}'")]
    UnknownNoteName {
        segment: usize,
        row: usize,
        name: String,
    },

    #[error("Segment {segment:02X}, row {row}: invalid octave '{octave}'")]
    InvalidOctave {
        segment: usize,
        row: usize,
        octave: String,
    },

    #[error("Segment {segment:02X}, row {row}: note code ${code:02X} does not fit a note byte")]
    NoteOutOfRange { segment: usize, row: usize, code: u32 },

    #[error("Segment {segment:02X}, row {row}: noise clone has no earlier note to copy")]
    UnknownCloneTarget { segment: usize, row: usize },

    #[error("Segment {segment:02X}: rest table is full, cannot add length {duration}")]
    DurationTableOverflow { segment: usize, duration: usize },

    #[error("Segment {segment:02X}: note length {duration} does not fit in a rest table byte")]
    DurationOutOfRange { segment: usize, duration: usize },

    #[error("Segment {segment:02X}: {channel} length {duration} is missing from the rest table")]
    MissingRestLength {
        segment: usize,
        channel: &'static str,
        duration: usize,
    },

    #[error("Segment {segment:02X}: {channel} note at row {row} has no resolved length")]
    UnresolvedDuration {
        segment: usize,
        channel: &'static str,
        row: usize,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
