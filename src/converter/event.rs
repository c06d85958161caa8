//! Note events extracted from a channel

use serde::Serialize;

/// Whether an event sounds or silences the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    Sounding,
    Rest,
}

/// A note or rest starting at a given row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEvent {
    /// Row the event starts on, relative to the segment start
    pub row: usize,
    pub kind: NoteKind,
    /// Note byte written to the channel stream
    pub note_code: u8,
    /// Length in rows, known once the whole segment has been read
    pub duration: Option<usize>,
}

impl NoteEvent {
    pub fn sounding(row: usize, note_code: u8) -> Self {
        Self {
            row,
            kind: NoteKind::Sounding,
            note_code,
            duration: None,
        }
    }

    pub fn rest(row: usize, rest_code: u8) -> Self {
        Self {
            row,
            kind: NoteKind::Rest,
            note_code: rest_code,
            duration: None,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.kind == NoteKind::Rest
    }
}
