// Builders module - Model-free passage generators
// Every builder returns a normalized passage and never fails on bad note data

pub mod drums;
pub mod melody;
pub mod scales;

pub use drums::{DrumSection, rock_drums};
pub use melody::{
    AbsoluteParams, MelodyItem, MelodyNote, MelodyParams, TimedEvent, absolute_sequence, melody,
};
pub use scales::{
    ArpeggioParams, MAJOR_PATTERN, MajorScaleParams, ScaleParams, arithmetic_scale, arpeggio,
    major_scale,
};

use crate::sequencer::normalize::normalize;
use crate::sequencer::note::{MIDI_MAX, Note};
use crate::sequencer::passage::Passage;
use crate::sequencer::timeline::{Tempo, TimeGridError};

/// Per-note duration, in seconds or in beats at the builder's tempo
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteDuration {
    Seconds(f64),
    Beats(f64),
}

impl NoteDuration {
    pub fn to_seconds(self, tempo: Tempo) -> f64 {
        match self {
            NoteDuration::Seconds(seconds) => seconds,
            NoteDuration::Beats(beats) => tempo.beats_to_seconds(beats),
        }
    }
}

impl Default for NoteDuration {
    /// Half a second per note
    fn default() -> Self {
        NoteDuration::Seconds(0.5)
    }
}

/// MIDI pitch from a signed value, or `None` when out of range
pub(crate) fn midi_pitch(pitch: i32) -> Option<u8> {
    u8::try_from(pitch).ok().filter(|p| *p <= MIDI_MAX)
}

/// Lays notes end-to-end from time zero
pub(crate) struct Cursor {
    time: f64,
    notes: Vec<Note>,
}

impl Cursor {
    pub(crate) fn new() -> Self {
        Self {
            time: 0.0,
            notes: Vec::new(),
        }
    }

    /// Append a note after the previous one.
    ///
    /// Non-positive durations produce nothing and do not move the cursor;
    /// an out-of-range pitch still occupies its slot.
    pub(crate) fn push(&mut self, pitch: i32, duration: f64, velocity: u8, program: u8) {
        if !(duration.is_finite() && duration > 0.0) {
            return;
        }
        let start = self.time;
        self.time += duration;
        if let Some(pitch) = midi_pitch(pitch) {
            self.notes.push(
                Note::new(pitch, start, self.time)
                    .with_velocity(velocity)
                    .with_program(program),
            );
        }
    }

    pub(crate) fn finish(self, tempo: Tempo) -> Result<Passage, TimeGridError> {
        let mut passage = Passage::from_notes(self.notes, tempo.qpm());
        passage.total_time = self.time;
        normalize(&passage)
    }
}
