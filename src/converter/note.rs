//! Note names and the per-segment rest table

/// Note names in pitch-class order
pub const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// Maximum number of lengths a segment can reference (4-bit opcode index)
pub const REST_TABLE_CAPACITY: usize = 16;

/// Pitch-class index of a note name
pub fn pitch_class(name: &str) -> Option<usize> {
    NOTE_NAMES.iter().position(|n| *n == name)
}

/// Noise note byte for a noise note name
///
/// The engine only knows two noise sounds. `0-` through `D-` share the
/// first one so songs using any of the low noise pitches still convert.
pub fn noise_note_byte(name: &str) -> Option<u8> {
    match name {
        "0-" | "1-" | "2-" | "3-" | "4-" | "5-" | "6-" | "7-" | "8-" | "9-" | "A-" | "B-"
        | "C-" | "D-" => Some(2),
        "E-" | "F-" => Some(3),
        _ => None,
    }
}

/// Distinct note lengths of one segment, in first-seen order
///
/// Channel streams refer to a length by its index in this table. Each
/// length is one byte of the engine's rest array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteTable {
    lengths: Vec<u8>,
}

impl NoteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a length if it is not present yet
    ///
    /// Returns the length's index, or `None` when the table is already full.
    pub fn insert(&mut self, length: u8) -> Option<usize> {
        if let Some(index) = self.index_of(length) {
            return Some(index);
        }
        if self.lengths.len() >= REST_TABLE_CAPACITY {
            return None;
        }
        self.lengths.push(length);
        Some(self.lengths.len() - 1)
    }

    pub fn index_of(&self, length: u8) -> Option<usize> {
        self.lengths.iter().position(|&l| l == length)
    }

    /// Length stored at an index
    pub fn get(&self, index: usize) -> Option<u8> {
        self.lengths.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.lengths.clone()
    }
}
