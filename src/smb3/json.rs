//! JSON serialization types for converted songs

use super::reader::{decode_channel, DecodedNote};
use crate::converter::channel::ChannelKind;
use crate::converter::event::NoteEvent;
use crate::converter::segment::{Segment, SegmentOffsets};
use crate::converter::{Song, Warning};
use crate::error::Result;
use serde::Serialize;

/// Top-level JSON structure for a converted song
#[derive(Debug, Clone, Serialize)]
pub struct SongJson {
    pub rows_per_pattern: usize,
    pub channel_count: usize,
    /// Non-fatal problems found during conversion
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub segments: Vec<SegmentJson>,
}

/// JSON representation of one segment
#[derive(Debug, Clone, Serialize)]
pub struct SegmentJson {
    pub number: usize,
    pub total_rows: usize,
    /// Rest table bytes
    pub rests: Vec<u8>,
    /// Header offsets into `data`
    pub offsets: SegmentOffsets,
    /// Concatenated channel streams
    pub data: Vec<u8>,
    pub channels: Vec<ChannelJson>,
}

/// JSON representation of one channel
#[derive(Debug, Clone, Serialize)]
pub struct ChannelJson {
    pub kind: ChannelKind,
    pub name: &'static str,
    /// Raw stream bytes
    pub buffer: Vec<u8>,
    /// Events extracted from the export
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<NoteEvent>,
    /// Notes read back from `buffer`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decoded: Vec<DecodedNote>,
}

impl SongJson {
    /// Create a SongJson from a converted song
    ///
    /// Every channel stream is read back so the dump shows what the engine
    /// will play.
    pub fn new(song: &Song) -> Result<Self> {
        let segments = song
            .segments
            .iter()
            .map(SegmentJson::new)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rows_per_pattern: song.rows_per_pattern,
            channel_count: song.channel_count,
            warnings: song.warnings.iter().map(Warning::to_string).collect(),
            segments,
        })
    }
}

impl SegmentJson {
    fn new(segment: &Segment) -> Result<Self> {
        let channels = segment
            .channels
            .iter()
            .map(|channel| {
                Ok(ChannelJson {
                    kind: channel.kind,
                    name: channel.kind.name(),
                    buffer: channel.buffer().to_vec(),
                    events: channel.events().to_vec(),
                    decoded: decode_channel(segment, channel.kind)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            number: segment.number,
            total_rows: segment.total_rows,
            rests: segment.rest_table.to_bytes(),
            offsets: segment.offsets(),
            data: segment.data(),
            channels,
        })
    }
}
