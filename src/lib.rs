pub mod converter;
pub mod error;
pub mod export;
pub mod smb3;

pub use converter::Song;
pub use error::Error;
pub use export::TextExport;
