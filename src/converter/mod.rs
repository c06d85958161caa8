//! Converter - turns exported rows into SMB3 segment data
//!
//! Each segment is converted in three passes over all of its channels:
//! rows are read into note events, event lengths are resolved into the
//! shared rest table, and only then are the channel streams written.

pub mod channel;
pub mod event;
pub mod note;
pub mod segment;

use crate::error::{Error, Result};
use crate::export::{ExportSettings, Row, TextExport};
use channel::{ChannelKind, NoiseHistory};
use segment::{split_segments, Segment};
use std::fmt;

/// Number of channels the engine knows about
pub const SUPPORTED_CHANNELS: usize = ChannelKind::ALL.len();

/// Problems that do not stop the conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The export has more columns than the engine has channels
    UnsupportedChannelCount { found: usize, supported: usize },
    /// A channel plays nothing in a segment
    DisabledChannel { segment: usize, channel: ChannelKind },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnsupportedChannelCount { found, supported } => write!(
                f,
                "Found {} channels but only the first {} (sq1, sq2, tri, nse, dpcm) are supported",
                found, supported
            ),
            Warning::DisabledChannel { segment, channel } => write!(
                f,
                "Segment {:02X}: The {} channel is disabled",
                segment,
                channel.name().to_uppercase()
            ),
        }
    }
}

/// A converted song
#[derive(Debug, Clone)]
pub struct Song {
    pub rows_per_pattern: usize,
    /// Channel columns actually read (at most [`SUPPORTED_CHANNELS`])
    pub channel_count: usize,
    pub segments: Vec<Segment>,
    pub warnings: Vec<Warning>,
}

impl Song {
    /// Convert a loaded text export
    pub fn from_export(export: &TextExport) -> Result<Self> {
        Self::convert(export.settings, &export.rows)
    }

    /// Convert rows using the given settings
    pub fn convert(settings: ExportSettings, rows: &[Row]) -> Result<Self> {
        let mut warnings = Vec::new();

        tracing::info!("Found {} ROWs per PATTERN", settings.rows_per_pattern);
        tracing::info!("Found {} channels", settings.channel_count);

        let mut channel_count = settings.channel_count;
        if channel_count > SUPPORTED_CHANNELS {
            let warning = Warning::UnsupportedChannelCount {
                found: channel_count,
                supported: SUPPORTED_CHANNELS,
            };
            tracing::warn!("{}", warning);
            warnings.push(warning);
            channel_count = SUPPORTED_CHANNELS;
        }

        check_row_order(rows)?;

        let bounds = split_segments(rows, 0)?;
        tracing::info!("Found {} segments", bounds.len());

        // Carried from segment to segment for noise clones
        let mut noise = NoiseHistory::new();
        let mut segments = Vec::with_capacity(bounds.len());

        for (number, range) in bounds.into_iter().enumerate() {
            // The marker row always exists: it ends this segment
            let end_row = rows[range.end].absolute(settings.rows_per_pattern);
            let start_row = rows[range.start].absolute(settings.rows_per_pattern);

            let segment = Segment::build(
                number,
                &rows[range],
                start_row,
                end_row,
                settings.rows_per_pattern,
                channel_count,
                &mut noise,
            )?;

            for channel in segment.disabled_channels() {
                let warning = Warning::DisabledChannel {
                    segment: number,
                    channel,
                };
                tracing::warn!("{}", warning);
                warnings.push(warning);
            }

            segments.push(segment);
        }

        Ok(Self {
            rows_per_pattern: settings.rows_per_pattern,
            channel_count,
            segments,
            warnings,
        })
    }
}

/// Rows must come in strictly increasing pattern/row order
fn check_row_order(rows: &[Row]) -> Result<()> {
    for pair in rows.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.pattern < prev.pattern {
            return Err(Error::OutOfOrderPattern {
                previous: prev.pattern,
                pattern: next.pattern,
            });
        }
        if next.pattern == prev.pattern && next.index <= prev.index {
            return Err(Error::OutOfOrderRow {
                pattern: next.pattern,
                row: next.index,
            });
        }
    }
    Ok(())
}
