// Sequencer module - Musical time bookkeeping
// Time grid, passages, normalization, grid reconciliation and composition

pub mod compose;
pub mod normalize;
pub mod note;
pub mod passage;
pub mod reconcile;
pub mod timeline;

pub use compose::{ConcatOptions, concatenate, merge, trim};
pub use normalize::{MIN_TOTAL_TIME, NormalizeOptions, normalize, normalize_with};
pub use note::{DEFAULT_VELOCITY, MIDI_MAX, Note};
pub use passage::{Passage, TempoMarker};
pub use reconcile::{
    ReconcileError, quantize, reconcile, reconcile_passage, reconcile_to, unquantize,
};
pub use timeline::{DEFAULT_QPM, GridResolution, Tempo, TimeGrid, TimeGridError};
