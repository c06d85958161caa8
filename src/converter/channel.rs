//! Channel kinds and per-channel note extraction

use super::event::NoteEvent;
use super::note::{noise_note_byte, pitch_class, NoteTable};
use crate::error::{Error, Result};
use crate::export::{Cell, BLANK_NOTE, BLANK_VOLUME, CUTOFF_NOTE, RELEASE_NOTE};
use crate::smb3::opcode;
use serde::Serialize;

/// The five 2A03 channels, in export column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Pulse1,
    Pulse2,
    Triangle,
    Noise,
    Dpcm,
}

impl ChannelKind {
    /// Channels in the order the export lists their columns
    pub const ALL: [ChannelKind; 5] = [
        ChannelKind::Pulse1,
        ChannelKind::Pulse2,
        ChannelKind::Triangle,
        ChannelKind::Noise,
        ChannelKind::Dpcm,
    ];

    /// Channels in the order their buffers are laid out in segment data
    pub const SEGMENT_ORDER: [ChannelKind; 5] = [
        ChannelKind::Pulse2,
        ChannelKind::Pulse1,
        ChannelKind::Triangle,
        ChannelKind::Noise,
        ChannelKind::Dpcm,
    ];

    /// Short name used in listings
    pub fn name(self) -> &'static str {
        match self {
            ChannelKind::Pulse1 => "sq1",
            ChannelKind::Pulse2 => "sq2",
            ChannelKind::Triangle => "tri",
            ChannelKind::Noise => "nse",
            ChannelKind::Dpcm => "dpcm",
        }
    }

    /// Note byte that silences this channel
    pub fn rest_code(self) -> u8 {
        match self {
            ChannelKind::Noise => opcode::NOISE_REST,
            _ => opcode::REST,
        }
    }

    /// Whether a volume of zero turns into a rest
    ///
    /// The triangle has no volume control and samples always play out.
    pub fn zero_volume_rests(self) -> bool {
        match self {
            ChannelKind::Pulse1 | ChannelKind::Pulse2 | ChannelKind::Noise => true,
            ChannelKind::Triangle | ChannelKind::Dpcm => false,
        }
    }

    /// Whether the stream ends with an end-of-segment byte
    ///
    /// Square 2 drives segment end in the engine; the noise stream needs the
    /// terminator as well.
    pub fn is_master(self) -> bool {
        match self {
            ChannelKind::Pulse2 | ChannelKind::Noise => true,
            ChannelKind::Pulse1 | ChannelKind::Triangle | ChannelKind::Dpcm => false,
        }
    }

    /// Note byte for a new note on this channel
    fn note_code(self, cell: &Cell, segment: usize, row: usize) -> Result<u8> {
        match self {
            ChannelKind::Noise => {
                noise_note_byte(cell.note).ok_or_else(|| Error::UnknownNoiseNoteName {
                    segment,
                    row,
                    name: cell.note.to_string(),
                })
            }
            ChannelKind::Dpcm => {
                // Sample channel notes are just the note index plus one
                let index = pitch_class(cell.note).ok_or_else(|| Error::UnknownNoteName {
                    segment,
                    row,
                    name: cell.note.to_string(),
                })?;
                Ok(index as u8 + 1)
            }
            ChannelKind::Pulse1 | ChannelKind::Pulse2 | ChannelKind::Triangle => {
                let index = pitch_class(cell.note).ok_or_else(|| Error::UnknownNoteName {
                    segment,
                    row,
                    name: cell.note.to_string(),
                })?;
                let octave = cell
                    .octave
                    .parse::<u32>()
                    .ok()
                    .filter(|&o| o >= 1)
                    .ok_or_else(|| Error::InvalidOctave {
                        segment,
                        row,
                        octave: cell.octave.to_string(),
                    })?;
                let code = index as u32 * 2 + (octave - 1) * 24;
                if code >= opcode::REST as u32 {
                    return Err(Error::NoteOutOfRange { segment, row, code });
                }
                Ok(code as u8)
            }
        }
    }
}

/// The two most recent noise events
///
/// Raising the volume on a silenced noise channel restarts the noise that
/// played before the silence, so this survives segment boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoiseHistory {
    latest: Option<NoteEvent>,
    previous: Option<NoteEvent>,
}

impl NoiseHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &NoteEvent) {
        self.previous = self.latest.take();
        self.latest = Some(event.clone());
    }

    pub fn latest(&self) -> Option<&NoteEvent> {
        self.latest.as_ref()
    }

    pub fn previous(&self) -> Option<&NoteEvent> {
        self.previous.as_ref()
    }

    fn latest_is_rest(&self) -> bool {
        self.latest.as_ref().is_some_and(NoteEvent::is_rest)
    }
}

/// Note events and output stream of one channel in one segment
#[derive(Debug, Clone)]
pub struct Channel {
    pub kind: ChannelKind,
    /// Segment this channel belongs to (for error reporting)
    pub segment: usize,
    events: Vec<NoteEvent>,
    buffer: Vec<u8>,
}

impl Channel {
    pub fn new(kind: ChannelKind, segment: usize) -> Self {
        Self {
            kind,
            segment,
            events: Vec::new(),
            buffer: Vec::new(),
        }
    }

    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// A channel without events is not played in this segment
    pub fn is_disabled(&self) -> bool {
        self.events.is_empty()
    }

    /// Read one row's column for this channel
    ///
    /// A new event starts when:
    /// 1. the note is cut (`---`), giving a rest
    /// 2. the volume is set to 0 on a channel with volume control, giving a rest
    /// 3. a noise note is silent and its volume is raised again, repeating the
    ///    noise from before the silence
    /// 4. a new note is written
    ///
    /// Anything else keeps the current note going.
    pub fn parse_cell(&mut self, row: usize, text: &str, noise: &mut NoiseHistory) -> Result<()> {
        let cell = Cell::parse(text);

        let mut is_rest = cell.note == CUTOFF_NOTE;
        let mut is_clone = false;
        let new_note = !matches!(cell.note, BLANK_NOTE | CUTOFF_NOTE | RELEASE_NOTE);

        if self.kind.zero_volume_rests() {
            if cell.volume == "0" {
                is_rest = true;
            } else if self.kind == ChannelKind::Noise
                && cell.note == BLANK_NOTE
                && cell.volume != BLANK_VOLUME
                && noise.latest_is_rest()
            {
                is_clone = true;
            }
        }

        let event = if is_rest {
            NoteEvent::rest(row, self.kind.rest_code())
        } else if is_clone {
            let source = noise.previous().ok_or(Error::UnknownCloneTarget {
                segment: self.segment,
                row,
            })?;
            NoteEvent {
                row,
                kind: source.kind,
                note_code: source.note_code,
                duration: None,
            }
        } else if new_note {
            let code = self.kind.note_code(&cell, self.segment, row)?;
            NoteEvent::sounding(row, code)
        } else {
            return Ok(());
        };

        if self.kind == ChannelKind::Noise {
            noise.record(&event);
        }
        self.events.push(event);
        Ok(())
    }

    /// Work out every event's length and add it to the rest table
    ///
    /// The last event lasts until the end of the segment. A length must fit
    /// in one byte of the rest table.
    pub fn resolve_durations(&mut self, total_rows: usize, table: &mut NoteTable) -> Result<()> {
        for i in 0..self.events.len() {
            let end = self.events.get(i + 1).map_or(total_rows, |next| next.row);
            let event = &mut self.events[i];
            let duration = end.saturating_sub(event.row);
            event.duration = Some(duration);

            let length = u8::try_from(duration).map_err(|_| Error::DurationOutOfRange {
                segment: self.segment,
                duration,
            })?;
            if table.insert(length).is_none() {
                return Err(Error::DurationTableOverflow {
                    segment: self.segment,
                    duration,
                });
            }
        }
        Ok(())
    }

    /// Build the channel stream from the resolved events
    ///
    /// A length opcode is only written when the length changes.
    pub fn encode(&mut self, table: &NoteTable) -> Result<()> {
        self.buffer.clear();
        if self.events.is_empty() {
            return Ok(());
        }

        let (segment, channel) = (self.segment, self.kind.name());
        let mut last_length = None;
        for event in &self.events {
            let unresolved = || Error::UnresolvedDuration {
                segment,
                channel,
                row: event.row,
            };
            let length = event.duration.ok_or_else(unresolved)?;
            if last_length != Some(length) {
                let index = u8::try_from(length)
                    .ok()
                    .and_then(|l| table.index_of(l))
                    .ok_or(Error::MissingRestLength {
                        segment,
                        channel,
                        duration: length,
                    })?;
                self.buffer.push(opcode::length(index));
                last_length = Some(length);
            }
            self.buffer.push(event.note_code);
        }

        if self.kind.is_master() {
            self.buffer.push(opcode::END_OF_SEGMENT);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::event::NoteKind;

    fn feed(channel: &mut Channel, noise: &mut NoiseHistory, rows: &[(usize, &str)]) {
        for (row, text) in rows {
            channel.parse_cell(*row, text, noise).unwrap();
        }
    }

    fn finish(channel: &mut Channel, total_rows: usize, table: &mut NoteTable) {
        channel.resolve_durations(total_rows, table).unwrap();
        channel.encode(table).unwrap();
    }

    #[test]
    fn test_pulse_rest_by_volume() {
        let mut noise = NoiseHistory::new();
        let mut table = NoteTable::new();
        let mut channel = Channel::new(ChannelKind::Pulse1, 0);
        feed(
            &mut channel,
            &mut noise,
            &[
                (0, " C-3 00 F ... "),
                (1, " ... .. . ... "),
                (2, " ... .. 0 ... "),
                (3, " ... .. . ... "),
                (4, " ... .. . ... "),
                (5, " D-3 00 F ... "),
            ],
        );
        finish(&mut channel, 6, &mut table);

        let events = channel.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, NoteKind::Sounding);
        assert_eq!(events[0].note_code, 48);
        assert_eq!(events[0].duration, Some(2));
        assert_eq!(events[1].kind, NoteKind::Rest);
        assert_eq!(events[1].note_code, 0x7E);
        assert_eq!(events[1].duration, Some(3));
        assert_eq!(events[2].note_code, 52);
        assert_eq!(events[2].duration, Some(1));

        assert_eq!(table.lengths(), &[2, 3, 1]);
        assert_eq!(channel.buffer(), &[0xA0, 48, 0xA1, 0x7E, 0xA2, 52]);
        // Noise history is untouched by other channels
        assert!(noise.latest().is_none());
    }

    #[test]
    fn test_pulse_note_codes() {
        let mut noise = NoiseHistory::new();
        let mut channel = Channel::new(ChannelKind::Pulse2, 0);
        feed(
            &mut channel,
            &mut noise,
            &[(0, "C-1 00 F"), (1, "D-1 00 F"), (2, "C#2 00 F"), (3, "B-5 00 F")],
        );
        let codes: Vec<u8> = channel.events().iter().map(|e| e.note_code).collect();
        assert_eq!(codes, vec![0, 4, 26, 118]);
    }

    #[test]
    fn test_cutoff_is_rest_on_every_channel() {
        for kind in ChannelKind::ALL {
            let mut noise = NoiseHistory::new();
            let mut channel = Channel::new(kind, 0);
            channel.parse_cell(0, " --- .. . ... ", &mut noise).unwrap();
            assert_eq!(channel.events().len(), 1);
            assert!(channel.events()[0].is_rest());
            assert_eq!(channel.events()[0].note_code, kind.rest_code());
        }
    }

    #[test]
    fn test_zero_volume_beats_new_note() {
        let mut noise = NoiseHistory::new();
        let mut channel = Channel::new(ChannelKind::Pulse1, 0);
        channel.parse_cell(0, " C-3 00 0 ... ", &mut noise).unwrap();
        assert!(channel.events()[0].is_rest());
    }

    #[test]
    fn test_triangle_ignores_volume() {
        let mut noise = NoiseHistory::new();
        let mut channel = Channel::new(ChannelKind::Triangle, 0);
        feed(
            &mut channel,
            &mut noise,
            &[(0, " A-2 00 F ... "), (1, " ... .. 0 ... "), (2, " ... .. F ... ")],
        );
        assert_eq!(channel.events().len(), 1);
        assert_eq!(channel.events()[0].note_code, 9 * 2 + 24);
    }

    #[test]
    fn test_dpcm_note_codes() {
        let mut noise = NoiseHistory::new();
        let mut table = NoteTable::new();
        let mut channel = Channel::new(ChannelKind::Dpcm, 0);
        feed(
            &mut channel,
            &mut noise,
            &[(0, " C-3 01 . ... "), (4, " F#3 01 0 ... ")],
        );
        finish(&mut channel, 8, &mut table);
        let codes: Vec<u8> = channel.events().iter().map(|e| e.note_code).collect();
        assert_eq!(codes, vec![1, 7]);
        assert_eq!(channel.buffer(), &[0xA0, 1, 7]);
    }

    #[test]
    fn test_noise_clone_copies_note_before_rest() {
        let mut noise = NoiseHistory::new();
        let mut table = NoteTable::new();
        let mut channel = Channel::new(ChannelKind::Noise, 0);
        feed(
            &mut channel,
            &mut noise,
            &[
                (0, " E-# 00 F ... "),
                (2, " ... .. 0 ... "),
                (3, " ... .. C ... "),
                (4, " ... .. B ... "),
            ],
        );
        finish(&mut channel, 6, &mut table);

        let events = channel.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].note_code, 3);
        assert_eq!(events[1].note_code, 1);
        assert!(events[1].is_rest());
        assert_eq!(events[2].kind, NoteKind::Sounding);
        assert_eq!(events[2].note_code, 3);
        assert_eq!(events[2].row, 3);
        assert_eq!(events[2].duration, Some(3));

        assert_eq!(table.lengths(), &[2, 1, 3]);
        assert_eq!(channel.buffer(), &[0xA0, 3, 0xA1, 1, 0xA2, 3, 0x00]);
        assert_eq!(noise.latest().map(|e| e.note_code), Some(3));
        assert_eq!(noise.previous().map(|e| e.note_code), Some(1));
    }

    #[test]
    fn test_noise_clone_without_source() {
        let mut noise = NoiseHistory::new();
        let mut channel = Channel::new(ChannelKind::Noise, 2);
        channel.parse_cell(0, " ... .. 0 ... ", &mut noise).unwrap();
        let result = channel.parse_cell(1, " ... .. F ... ", &mut noise);
        assert!(matches!(
            result,
            Err(Error::UnknownCloneTarget { segment: 2, row: 1 })
        ));
    }

    #[test]
    fn test_noise_volume_without_rest_is_not_a_clone() {
        let mut noise = NoiseHistory::new();
        let mut channel = Channel::new(ChannelKind::Noise, 0);
        feed(
            &mut channel,
            &mut noise,
            &[(0, " 4-# 00 F ... "), (1, " ... .. 8 ... ")],
        );
        assert_eq!(channel.events().len(), 1);
        assert_eq!(channel.events()[0].note_code, 2);
    }

    #[test]
    fn test_noise_history_carries_into_new_channel() {
        let mut noise = NoiseHistory::new();
        let mut first = Channel::new(ChannelKind::Noise, 0);
        feed(
            &mut first,
            &mut noise,
            &[(0, " F-# 00 F ... "), (1, " ... .. 0 ... ")],
        );

        let mut second = Channel::new(ChannelKind::Noise, 1);
        second.parse_cell(0, " ... .. F ... ", &mut noise).unwrap();
        assert_eq!(second.events().len(), 1);
        assert_eq!(second.events()[0].note_code, 3);
        assert_eq!(second.events()[0].kind, NoteKind::Sounding);
    }

    #[test]
    fn test_unknown_noise_note() {
        let mut noise = NoiseHistory::new();
        let mut channel = Channel::new(ChannelKind::Noise, 0);
        let result = channel.parse_cell(0, " G#3 00 F ... ", &mut noise);
        assert!(matches!(result, Err(Error::UnknownNoiseNoteName { name, .. }) if name == "G#"));
    }

    #[test]
    fn test_invalid_octave_and_range() {
        let mut noise = NoiseHistory::new();
        let mut channel = Channel::new(ChannelKind::Pulse1, 0);
        assert!(matches!(
            channel.parse_cell(0, " C-0 00 F ... ", &mut noise),
            Err(Error::InvalidOctave { .. })
        ));
        assert!(matches!(
            channel.parse_cell(0, " D#6 00 F ... ", &mut noise),
            Err(Error::NoteOutOfRange { code: 126, .. })
        ));
    }

    #[test]
    fn test_release_continues_note() {
        let mut noise = NoiseHistory::new();
        let mut channel = Channel::new(ChannelKind::Pulse1, 0);
        feed(
            &mut channel,
            &mut noise,
            &[(0, " C-3 00 F ... "), (2, " === .. . ... ")],
        );
        assert_eq!(channel.events().len(), 1);
    }

    #[test]
    fn test_length_opcode_only_on_change() {
        let mut noise = NoiseHistory::new();
        let mut table = NoteTable::new();
        let mut channel = Channel::new(ChannelKind::Pulse2, 0);
        feed(
            &mut channel,
            &mut noise,
            &[
                (0, "C-2 00 F"),
                (2, "D-2 00 F"),
                (4, "E-2 00 F"),
                (8, "F-2 00 F"),
                (10, "G-2 00 F"),
            ],
        );
        finish(&mut channel, 12, &mut table);
        assert_eq!(table.lengths(), &[2, 4]);
        assert_eq!(
            channel.buffer(),
            &[0xA0, 24, 28, 0xA1, 32, 0xA0, 34, 38, 0x00]
        );
    }

    #[test]
    fn test_disabled_channel_has_no_terminator() {
        let mut table = NoteTable::new();
        let mut channel = Channel::new(ChannelKind::Pulse2, 0);
        finish(&mut channel, 16, &mut table);
        assert!(channel.is_disabled());
        assert!(channel.buffer().is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_duration_table_overflow() {
        let mut noise = NoiseHistory::new();
        let mut table = NoteTable::new();
        let mut channel = Channel::new(ChannelKind::Triangle, 3);
        // Lengths 1, 2, ..., 17
        let mut row = 0;
        for length in 1..=17 {
            channel.parse_cell(row, "C-3 00 .", &mut noise).unwrap();
            row += length;
        }
        let result = channel.resolve_durations(row, &mut table);
        assert!(matches!(
            result,
            Err(Error::DurationTableOverflow {
                segment: 3,
                duration: 17
            })
        ));
        assert_eq!(table.len(), 16);
    }

    #[test]
    fn test_duration_longer_than_a_byte() {
        let mut noise = NoiseHistory::new();
        let mut table = NoteTable::new();
        let mut channel = Channel::new(ChannelKind::Triangle, 1);
        channel.parse_cell(0, " C-3 00 . ... ", &mut noise).unwrap();
        channel.parse_cell(1, " D-3 00 . ... ", &mut noise).unwrap();
        // 256 rows cannot be stored as a rest table byte
        let result = channel.resolve_durations(257, &mut table);
        assert!(matches!(
            result,
            Err(Error::DurationOutOfRange {
                segment: 1,
                duration: 256
            })
        ));
        assert_eq!(table.lengths(), &[1]);
    }

    #[test]
    fn test_longest_duration_fits() {
        let mut noise = NoiseHistory::new();
        let mut table = NoteTable::new();
        let mut channel = Channel::new(ChannelKind::Triangle, 0);
        channel.parse_cell(0, " C-3 00 . ... ", &mut noise).unwrap();
        finish(&mut channel, 255, &mut table);
        assert_eq!(table.to_bytes(), vec![255]);
        assert_eq!(channel.buffer(), &[0xA0, 48]);
    }

    #[test]
    fn test_encode_with_length_missing_from_table() {
        let mut noise = NoiseHistory::new();
        let mut resolved = NoteTable::new();
        let mut channel = Channel::new(ChannelKind::Pulse1, 4);
        channel.parse_cell(0, " C-3 00 F ... ", &mut noise).unwrap();
        channel.resolve_durations(3, &mut resolved).unwrap();

        let result = channel.encode(&NoteTable::new());
        assert!(matches!(
            result,
            Err(Error::MissingRestLength {
                segment: 4,
                channel: "sq1",
                duration: 3
            })
        ));
        assert!(channel.buffer().is_empty());
    }

    #[test]
    fn test_noise_clone_of_rest_stays_rest() {
        let mut noise = NoiseHistory::new();
        let mut table = NoteTable::new();
        let mut channel = Channel::new(ChannelKind::Noise, 0);
        feed(
            &mut channel,
            &mut noise,
            &[
                (0, " --- .. . ... "),
                (1, " ... .. 0 ... "),
                (2, " ... .. F ... "),
            ],
        );
        finish(&mut channel, 3, &mut table);

        let events = channel.events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(NoteEvent::is_rest));
        assert_eq!(events[2].kind, NoteKind::Rest);
        assert_eq!(events[2].note_code, 1);
        assert_eq!(channel.buffer(), &[0xA0, 1, 1, 1, 0x00]);
    }
}
