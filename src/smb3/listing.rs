//! Assembly listing of converted segments

use crate::converter::segment::Segment;
use crate::converter::Song;
use std::fmt::Write;

/// Bytes per `.byte` line
const BYTES_PER_LINE: usize = 16;

const SEGMENT_RULE: &str = "============================================";
const CLOSING_RULE: &str =
    "====================================================================================================";

/// Format bytes as `.byte $XX, ...` lines, each starting on a new line
pub fn pretty_array(bytes: &[u8]) -> String {
    let mut s = String::new();
    for (i, b) in bytes.iter().enumerate() {
        if i % BYTES_PER_LINE == 0 {
            s.push_str("\n\t.byte ");
        }
        let _ = write!(s, "${:02X}", b);
        if i % BYTES_PER_LINE != BYTES_PER_LINE - 1 && i != bytes.len() - 1 {
            s.push_str(", ");
        }
    }
    s
}

/// Rest table, header offsets and segment data as pasted into the game source
fn format_asm(segment: &Segment) -> String {
    let offsets = segment.offsets();
    let mut s = String::new();

    s.push_str("Rests array:");
    s.push_str(&pretty_array(&segment.rest_table.to_bytes()));
    s.push_str("\n\n");

    let _ = writeln!(s, "Segment {:02X} header offsets:", segment.number);
    s.push_str("    tri, sq1, nse, dpcm\n");
    let _ = writeln!(
        s,
        "    ${:02X}, ${:02X}, ${:02X}, ${:02X}\n",
        offsets.triangle, offsets.pulse1, offsets.noise, offsets.dpcm
    );

    let _ = write!(s, "Segment {:02X} data:", segment.number);
    s.push_str(&pretty_array(&segment.data()));
    s.push_str("\n\n");

    s
}

/// Rest table and each channel stream on its own
fn format_channels(segment: &Segment) -> String {
    let mut s = String::new();

    s.push_str("Rests array:");
    s.push_str(&pretty_array(&segment.rest_table.to_bytes()));
    s.push_str("\n\n");

    for channel in &segment.channels {
        let _ = write!(s, "{} channel:", channel.kind.name());
        s.push_str(&pretty_array(channel.buffer()));
        s.push_str("\n\n");
    }

    s
}

/// Full listing of one segment
pub fn format_segment(segment: &Segment) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "\n{} Segment {:02X} {}",
        SEGMENT_RULE, segment.number, SEGMENT_RULE
    );
    s.push_str("= Assembly Format:\n");
    s.push_str(&format_asm(segment));
    s.push_str("= Individual Channel Data:\n");
    s.push_str(&format_channels(segment));
    s.push_str(CLOSING_RULE);
    s.push_str("\n\n");
    s
}

/// Listing of every segment in order
pub fn format_song(song: &Song) -> String {
    song.segments.iter().map(format_segment).collect()
}
