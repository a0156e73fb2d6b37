// Interchange - Loosely typed note sequences crossing the crate boundary

pub mod raw;

pub use raw::{InterchangeError, Numeric, RawNote, RawNoteSequence, RawQuantizationInfo, RawTempo};
