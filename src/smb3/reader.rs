//! SMB3 channel stream reader

use super::opcode;
use crate::converter::channel::ChannelKind;
use crate::converter::note::NoteTable;
use crate::converter::segment::Segment;
use crate::error::{Error, Result};
use serde::Serialize;

/// A note read back from a channel stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodedNote {
    pub note_code: u8,
    /// Length in rows
    pub duration: usize,
}

/// Reads a channel stream using its segment's rest table
pub struct ChannelReader<'a> {
    data: &'a [u8],
    pos: usize,
    rest_table: &'a NoteTable,
}

impl<'a> ChannelReader<'a> {
    pub fn new(data: &'a [u8], rest_table: &'a NoteTable) -> Self {
        Self {
            data,
            pos: 0,
            rest_table,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(Error::Decode("Unexpected end of stream".into()));
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Read every note of the stream
    ///
    /// With `terminated` set the stream must end with the end-of-segment
    /// byte, which is consumed but not returned. Empty streams are valid
    /// either way.
    pub fn read_notes(&mut self, terminated: bool) -> Result<Vec<DecodedNote>> {
        let mut notes = Vec::new();
        if self.is_eof() {
            return Ok(notes);
        }

        let end = if terminated {
            match self.data.last() {
                Some(&opcode::END_OF_SEGMENT) => self.data.len() - 1,
                _ => return Err(Error::Decode("Missing end of segment byte".into())),
            }
        } else {
            self.data.len()
        };

        let mut length = None;
        while self.pos < end {
            let at = self.pos;
            let byte = self.read_u8()?;

            if let Some(index) = opcode::length_index(byte) {
                let duration = self.rest_table.get(index).ok_or_else(|| {
                    Error::Decode(format!(
                        "Length index {} at offset {} is outside the rest table",
                        index, at
                    ))
                })?;
                length = Some(usize::from(duration));
            } else if opcode::is_note(byte) {
                let duration = length.ok_or_else(|| {
                    Error::Decode(format!("Note at offset {} has no length set", at))
                })?;
                notes.push(DecodedNote {
                    note_code: byte,
                    duration,
                });
            } else {
                return Err(Error::Decode(format!(
                    "Unknown byte ${:02X} at offset {}",
                    byte, at
                )));
            }
        }

        self.pos = self.data.len();
        Ok(notes)
    }
}

/// Read back one channel of an encoded segment
pub fn decode_channel(segment: &Segment, kind: ChannelKind) -> Result<Vec<DecodedNote>> {
    let channel = segment.channel(kind);
    ChannelReader::new(channel.buffer(), &segment.rest_table).read_notes(kind.is_master())
}
