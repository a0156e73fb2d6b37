// Note representation for passages
// A note is a timed MIDI event with pitch, velocity and instrument metadata

use serde::{Deserialize, Serialize};

/// Velocity used when a producer leaves it unresolved
pub const DEFAULT_VELOCITY: u8 = 96;

/// Highest valid MIDI pitch, velocity and program number
pub const MIDI_MAX: u8 = 127;

/// A single musical event
///
/// Times are in seconds. The quantized mirror is only meaningful when the
/// owning passage declares a grid resolution; the normalizer recomputes it
/// from the time fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// MIDI note number (0-127, where 60 = C4)
    pub pitch: u8,

    pub start_time: f64,
    pub end_time: f64,

    /// MIDI velocity, canonical range 1-127
    pub velocity: u8,

    /// General MIDI program (timbre)
    pub program: u8,

    /// Drum notes are exempt from pitch-based instrument semantics
    pub is_drum: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantized_start_step: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantized_end_step: Option<u32>,

    /// Voice/part tag used for multi-voice separation (e.g. SATB)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<u32>,
}

impl Note {
    /// Creates a note with default velocity and program 0
    pub fn new(pitch: u8, start_time: f64, end_time: f64) -> Self {
        Self {
            pitch,
            start_time,
            end_time,
            velocity: DEFAULT_VELOCITY,
            program: 0,
            is_drum: false,
            quantized_start_step: None,
            quantized_end_step: None,
            instrument: None,
        }
    }

    /// Creates a note that only carries grid steps (times are filled in by the normalizer)
    pub fn from_steps(pitch: u8, start_step: u32, end_step: u32) -> Self {
        Self {
            quantized_start_step: Some(start_step),
            quantized_end_step: Some(end_step),
            ..Self::new(pitch, 0.0, 0.0)
        }
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_program(mut self, program: u8) -> Self {
        self.program = program;
        self
    }

    pub fn with_drum(mut self, is_drum: bool) -> Self {
        self.is_drum = is_drum;
        self
    }

    pub fn with_instrument(mut self, instrument: u32) -> Self {
        self.instrument = Some(instrument);
        self
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// True if the time fields describe a playable note
    pub fn has_valid_times(&self) -> bool {
        self.start_time.is_finite()
            && self.end_time.is_finite()
            && self.start_time >= 0.0
            && self.end_time > self.start_time
    }

    /// True if the quantized fields describe a non-empty note
    pub fn has_valid_steps(&self) -> bool {
        matches!(
            (self.quantized_start_step, self.quantized_end_step),
            (Some(start), Some(end)) if end > start
        )
    }

    /// Check if this note is sounding at a given time
    pub fn contains_time(&self, seconds: f64) -> bool {
        seconds >= self.start_time && seconds < self.end_time
    }

    /// Copy of this note moved by `offset` seconds (quantized fields are dropped)
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            start_time: self.start_time + offset,
            end_time: self.end_time + offset,
            quantized_start_step: None,
            quantized_end_step: None,
            ..self.clone()
        }
    }

    /// Get the note name (e.g., "C4", "A#5")
    pub fn note_name(&self) -> String {
        const NOTE_NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];

        let octave = (self.pitch / 12) as i32 - 1;
        let note_index = (self.pitch % 12) as usize;

        format!("{}{}", NOTE_NAMES[note_index], octave)
    }
}
