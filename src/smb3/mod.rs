pub mod json;
pub mod listing;
pub mod opcode;
pub mod reader;

pub use json::SongJson;
pub use listing::{format_segment, format_song, pretty_array};
pub use reader::{ChannelReader, DecodedNote};
