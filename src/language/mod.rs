//! Language tallies and the selection rules applied before display.

pub mod select;
pub mod tally;
pub mod unit;

pub use select::{select, LanguageRow, Selection};
pub use tally::{LanguageByteMap, Tally, TallyMode, YearBuckets};
pub use unit::ByteUnit;
