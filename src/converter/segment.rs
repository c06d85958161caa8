//! Song segments: boundary detection and per-segment encoding

use super::channel::{Channel, ChannelKind, NoiseHistory};
use super::note::NoteTable;
use crate::error::{Error, Result};
use crate::export::Row;
use serde::Serialize;
use std::ops::Range;

/// Effect command that ends segment `number`
pub fn segment_marker(number: usize) -> String {
    format!("C{:02X}", number)
}

/// Find the row ranges of every segment
///
/// Segment N runs from its first row up to, but not including, the row
/// carrying `C{N:02X}`. That row starts segment N+1. Rows after the last
/// marker are not part of any segment.
pub fn split_segments(rows: &[Row], first_row: usize) -> Result<Vec<Range<usize>>> {
    let mut bounds = Vec::new();
    let mut start = first_row.min(rows.len());

    loop {
        let marker = segment_marker(bounds.len());
        let found = rows[start..].iter().position(|row| row.has_effect(&marker));
        let Some(offset) = found else {
            break;
        };
        let end = start + offset;
        bounds.push(start..end);
        start = end;
    }

    if bounds.is_empty() {
        return Err(Error::NoSegmentsFound);
    }
    Ok(bounds)
}

/// Start of each channel's stream within the segment data
///
/// Channels without data get offset 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SegmentOffsets {
    pub triangle: usize,
    pub pulse1: usize,
    pub noise: usize,
    pub dpcm: usize,
}

/// One independently encoded part of the song
#[derive(Debug, Clone)]
pub struct Segment {
    pub number: usize,
    /// Length of the segment in rows
    pub total_rows: usize,
    /// Lengths referenced by the channel streams
    pub rest_table: NoteTable,
    /// Channels in export column order
    pub channels: [Channel; 5],
}

impl Segment {
    /// Encode a segment
    ///
    /// `start_row` and `end_row` are absolute row numbers, `end_row` being
    /// exclusive. Only the first `channel_count` columns of each row are
    /// read.
    pub fn build(
        number: usize,
        rows: &[Row],
        start_row: usize,
        end_row: usize,
        rows_per_pattern: usize,
        channel_count: usize,
        noise: &mut NoiseHistory,
    ) -> Result<Self> {
        let mut segment = Self {
            number,
            total_rows: end_row.saturating_sub(start_row),
            rest_table: NoteTable::new(),
            channels: ChannelKind::ALL.map(|kind| Channel::new(kind, number)),
        };

        for row in rows {
            let relative = row.absolute(rows_per_pattern) - start_row;
            for (channel, text) in segment
                .channels
                .iter_mut()
                .zip(row.cells.iter())
                .take(channel_count)
            {
                channel.parse_cell(relative, text, noise)?;
            }
        }

        // Every length has to be in the rest table before any stream is written
        for channel in &mut segment.channels {
            channel.resolve_durations(segment.total_rows, &mut segment.rest_table)?;
        }
        for channel in &mut segment.channels {
            channel.encode(&segment.rest_table)?;
        }

        tracing::debug!(
            "Segment {:02X}: {} rows, {} rest lengths, {} bytes",
            number,
            segment.total_rows,
            segment.rest_table.len(),
            segment.channels.iter().map(|c| c.buffer().len()).sum::<usize>()
        );

        Ok(segment)
    }

    pub fn channel(&self, kind: ChannelKind) -> &Channel {
        match kind {
            ChannelKind::Pulse1 => &self.channels[0],
            ChannelKind::Pulse2 => &self.channels[1],
            ChannelKind::Triangle => &self.channels[2],
            ChannelKind::Noise => &self.channels[3],
            ChannelKind::Dpcm => &self.channels[4],
        }
    }

    /// Channels that have nothing to play in this segment
    pub fn disabled_channels(&self) -> Vec<ChannelKind> {
        self.channels
            .iter()
            .filter(|c| c.is_disabled())
            .map(|c| c.kind)
            .collect()
    }

    /// All channel streams concatenated in segment data order
    pub fn data(&self) -> Vec<u8> {
        ChannelKind::SEGMENT_ORDER
            .iter()
            .flat_map(|&kind| self.channel(kind).buffer().iter().copied())
            .collect()
    }

    /// Offsets of the channel streams within [`Segment::data`]
    pub fn offsets(&self) -> SegmentOffsets {
        let mut offsets = SegmentOffsets::default();
        let mut position = 0;

        for kind in ChannelKind::SEGMENT_ORDER {
            let len = self.channel(kind).buffer().len();
            let offset = if len > 0 { position } else { 0 };
            match kind {
                // Square 2 always starts the data
                ChannelKind::Pulse2 => {}
                ChannelKind::Pulse1 => offsets.pulse1 = offset,
                ChannelKind::Triangle => offsets.triangle = offset,
                ChannelKind::Noise => offsets.noise = offset,
                ChannelKind::Dpcm => offsets.dpcm = offset,
            }
            position += len;
        }

        offsets
    }
}
