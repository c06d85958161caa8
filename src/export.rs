//! FamiTracker text export loader
//!
//! Only the parts of the export the converter needs are read: the first
//! `TRACK` line (rows per pattern), the `COLUMNS` line (channel count) and
//! every `PATTERN`/`ROW` line of that track.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Note field of an empty cell
pub const BLANK_NOTE: &str = "..";
/// Note field of a note cut
pub const CUTOFF_NOTE: &str = "--";
/// Note field of a note release
pub const RELEASE_NOTE: &str = "==";
/// Volume field of a cell without a volume change
pub const BLANK_VOLUME: &str = ".";

/// Global settings of the exported track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSettings {
    /// Rows in every pattern
    pub rows_per_pattern: usize,
    /// Number of channel columns in each row
    pub channel_count: usize,
}

/// One `ROW` line of the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Pattern the row belongs to
    pub pattern: usize,
    /// Row number inside the pattern
    pub index: usize,
    /// Raw text of each channel column
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(pattern: usize, index: usize, cells: Vec<String>) -> Self {
        Self {
            pattern,
            index,
            cells,
        }
    }

    /// Row number counted from the start of the track
    pub fn absolute(&self, rows_per_pattern: usize) -> usize {
        self.pattern * rows_per_pattern + self.index
    }

    /// Whether any channel carries the given effect command
    pub fn has_effect(&self, command: &str) -> bool {
        self.cells
            .iter()
            .any(|text| Cell::parse(text).effects.iter().any(|e| *e == command))
    }
}

/// Fields of a single channel column, e.g. `E-3 00 F P7D V01`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell<'a> {
    /// Note name without the octave (`C-`, `F#`, `..`, `--`)
    pub note: &'a str,
    /// Octave character (`3`, or `#` for noise notes)
    pub octave: &'a str,
    pub instrument: &'a str,
    pub volume: &'a str,
    pub effects: Vec<&'a str>,
}

impl<'a> Cell<'a> {
    /// Split a channel column into its fields
    ///
    /// Missing fields read as blank.
    pub fn parse(text: &'a str) -> Self {
        let mut tokens = text.split_whitespace();

        let (note, octave) = match tokens.next() {
            Some(token) => match token.char_indices().last() {
                Some((split, _)) if split > 0 => token.split_at(split),
                _ => (BLANK_NOTE, "."),
            },
            None => (BLANK_NOTE, "."),
        };
        let instrument = tokens.next().unwrap_or("..");
        let volume = tokens.next().unwrap_or(BLANK_VOLUME);
        let effects = tokens.collect();

        Self {
            note,
            octave,
            instrument,
            volume,
            effects,
        }
    }
}

/// Parsed text export
#[derive(Debug, Clone)]
pub struct TextExport {
    pub settings: ExportSettings,
    pub rows: Vec<Row>,
}

impl TextExport {
    /// Load an export from a file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open '{}': {}", path.display(), e),
            ))
        })?;
        Self::read(file)
    }

    /// Load an export from any reader
    pub fn read<R: Read>(input: R) -> Result<Self> {
        let reader = BufReader::new(input);

        let mut rows_per_pattern = None;
        let mut channel_count = None;
        let mut pattern = 0;
        let mut rows = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = number + 1;
            let line = line.trim_start_matches('\u{FEFF}').trim();

            let keyword = line.split_whitespace().next().unwrap_or("");
            match keyword {
                "TRACK" => {
                    if rows_per_pattern.is_some() {
                        tracing::warn!(
                            "Only the first track is converted, ignoring everything from line {}",
                            line_no
                        );
                        break;
                    }
                    rows_per_pattern = Some(parse_track(line, line_no)?);
                }
                "COLUMNS" => {
                    if channel_count.is_none() {
                        channel_count = Some(parse_columns(line, line_no)?);
                    }
                }
                "PATTERN" => {
                    pattern = parse_hex(line.split_whitespace().nth(1), line_no, "pattern")?;
                }
                "ROW" => rows.push(parse_row(line, line_no, pattern)?),
                _ => {}
            }
        }

        let settings = ExportSettings {
            rows_per_pattern: rows_per_pattern.ok_or(Error::MissingSetting("TRACK"))?,
            channel_count: channel_count.ok_or(Error::MissingSetting("COLUMNS"))?,
        };

        Ok(Self { settings, rows })
    }
}

/// `TRACK  64   6 150 "Name"` -> 64
fn parse_track(line: &str, line_no: usize) -> Result<usize> {
    let rows = line
        .split_whitespace()
        .nth(1)
        .and_then(|t| t.parse::<usize>().ok())
        .filter(|&rows| rows > 0)
        .ok_or_else(|| Error::Parse {
            line: line_no,
            message: "TRACK needs a positive rows-per-pattern value".into(),
        })?;
    Ok(rows)
}

/// `COLUMNS : 1 1 1 1 1` -> 5
fn parse_columns(line: &str, line_no: usize) -> Result<usize> {
    match line.split_once(':') {
        Some((_, columns)) => Ok(columns.split_whitespace().count()),
        None => Err(Error::Parse {
            line: line_no,
            message: "COLUMNS line has no ':'".into(),
        }),
    }
}

/// `ROW 0A : C-3 00 F ... : ...`
fn parse_row(line: &str, line_no: usize, pattern: usize) -> Result<Row> {
    let mut parts = line.split(':');
    let head = parts.next().unwrap_or("");
    let index = parse_hex(head.split_whitespace().nth(1), line_no, "row")?;
    let cells = parts.map(str::to_string).collect();
    Ok(Row::new(pattern, index, cells))
}

fn parse_hex(token: Option<&str>, line_no: usize, what: &str) -> Result<usize> {
    token
        .and_then(|t| usize::from_str_radix(t, 16).ok())
        .ok_or_else(|| Error::Parse {
            line: line_no,
            message: format!("Expected a hexadecimal {} number", what),
        })
}
