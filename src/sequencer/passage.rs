// Passage - A timed collection of notes plus tempo/grid metadata
// A passage is the unit every builder, model and file loader exchanges

use crate::sequencer::note::Note;
use crate::sequencer::timeline::{DEFAULT_QPM, GridResolution, Tempo, TimeGrid, TimeGridError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Tempo marker. Only a single marker at time 0 is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoMarker {
    pub time: f64,
    pub qpm: f64,
}

impl TempoMarker {
    pub fn at_start(qpm: f64) -> Self {
        Self { time: 0.0, qpm }
    }
}

/// A musical passage
///
/// Passages are values: every transformation in this crate returns a new
/// passage and leaves its input untouched. Use the normalizer to bring a
/// passage from any producer into canonical form before relying on
/// `total_time` or the quantized fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Passage {
    pub notes: Vec<Note>,

    pub tempos: Vec<TempoMarker>,

    /// Grid resolution; `None` means the passage is free-time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_per_quarter: Option<u32>,

    /// Rendering/playback horizon in seconds
    pub total_time: f64,

    /// Present iff `steps_per_quarter` is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u32>,
}

/// Canonical presentation order: start time, then pitch
pub(crate) fn presentation_order(a: &Note, b: &Note) -> Ordering {
    a.start_time
        .total_cmp(&b.start_time)
        .then(a.pitch.cmp(&b.pitch))
}

impl Passage {
    /// Create an empty free-time passage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a free-time passage at the given tempo
    pub fn from_notes(notes: Vec<Note>, qpm: f64) -> Self {
        Self {
            notes,
            tempos: vec![TempoMarker::at_start(qpm)],
            ..Self::default()
        }
    }

    /// Declare a grid resolution (quantized fields are filled in by the normalizer)
    pub fn with_steps_per_quarter(mut self, steps_per_quarter: u32) -> Self {
        self.steps_per_quarter = Some(steps_per_quarter);
        self
    }

    /// QPM of the first tempo marker, if any
    pub fn qpm(&self) -> Option<f64> {
        self.tempos.first().map(|t| t.qpm)
    }

    /// Tempo of this passage, defaulting to 120 QPM when no marker exists
    pub fn tempo(&self) -> Result<Tempo, TimeGridError> {
        Tempo::new(self.qpm().unwrap_or(DEFAULT_QPM))
    }

    /// Time grid of this passage, or `None` if it is free-time
    pub fn grid(&self) -> Result<Option<TimeGrid>, TimeGridError> {
        match self.steps_per_quarter {
            Some(spq) => Ok(Some(TimeGrid {
                tempo: self.tempo()?,
                resolution: GridResolution::new(spq)?,
            })),
            None => Ok(None),
        }
    }

    pub fn is_quantized(&self) -> bool {
        self.steps_per_quarter.is_some()
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Latest end time among notes with valid times
    pub fn max_end_time(&self) -> f64 {
        self.notes
            .iter()
            .filter(|n| n.end_time.is_finite())
            .fold(0.0, |mx, n| mx.max(n.end_time))
    }

    /// Latest quantized end step among notes
    pub fn max_end_step(&self) -> u32 {
        self.notes
            .iter()
            .filter_map(|n| n.quantized_end_step)
            .max()
            .unwrap_or(0)
    }

    /// Find notes sounding at a given time
    pub fn notes_at(&self, seconds: f64) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| n.contains_time(seconds))
            .collect()
    }

    /// Find notes overlapping `[start, end)`
    pub fn notes_in_range(&self, start: f64, end: f64) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| n.start_time < end && n.end_time > start)
            .collect()
    }

    /// Copy with every note assigned to one program/drum setting
    pub fn with_instrument(&self, program: u8, is_drum: bool) -> Self {
        let mut out = self.clone();
        for note in out.notes.iter_mut() {
            note.program = program;
            note.is_drum = is_drum;
        }
        out
    }

    /// Copy with a single tempo marker at time 0 (note times are kept as-is)
    pub fn with_tempo(&self, qpm: f64) -> Self {
        Self {
            tempos: vec![TempoMarker::at_start(qpm)],
            ..self.clone()
        }
    }

    /// Notes in presentation order (start time, then pitch)
    pub fn sorted_notes(&self) -> Vec<Note> {
        let mut notes = self.notes.clone();
        notes.sort_by(presentation_order);
        notes
    }

    /// Distinct pitches in ascending order
    pub fn pitches(&self) -> Vec<u8> {
        let mut pitches: Vec<u8> = self.notes.iter().map(|n| n.pitch).collect();
        pitches.sort_unstable();
        pitches.dedup();
        pitches
    }
}
