//! SMB3 music stream bytes

/// Rest note byte for every channel except noise
pub const REST: u8 = 0x7E;
/// Rest note byte for the noise channel
pub const NOISE_REST: u8 = 0x01;
/// End of segment, written at the end of master channel streams
pub const END_OF_SEGMENT: u8 = 0x00;
/// Set note length; the low nibble indexes the segment's rest table
pub const SET_LENGTH: u8 = 0xA0;

/// Length opcode for a rest table index
pub fn length(index: usize) -> u8 {
    SET_LENGTH | (index as u8 & 0x0F)
}

/// Rest table index of a length opcode, `None` for any other byte
pub fn length_index(byte: u8) -> Option<usize> {
    if byte & 0xF0 == SET_LENGTH {
        Some((byte & 0x0F) as usize)
    } else {
        None
    }
}

/// Bytes below this value are notes
pub fn is_note(byte: u8) -> bool {
    byte < 0x80
}
