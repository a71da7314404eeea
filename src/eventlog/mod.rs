pub mod event;
pub mod fields;
pub mod parse;
pub mod stats;

pub use self::event::EventKind;
pub use self::parse::{decode_line, DecodeError, RawRecord};
pub use self::stats::IngestStats;
