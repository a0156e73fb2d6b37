// Scales - Arithmetic scales, arpeggios and diatonic major scales

use crate::builders::{Cursor, NoteDuration};
use crate::sequencer::note::DEFAULT_VELOCITY;
use crate::sequencer::passage::Passage;
use crate::sequencer::timeline::{DEFAULT_QPM, Tempo, TimeGridError};

/// Semitone steps of a major scale (W W H W W W H)
pub const MAJOR_PATTERN: [i32; 7] = [2, 2, 1, 2, 2, 2, 1];

/// Parameters for `arithmetic_scale`
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleParams {
    pub tonic: i32,
    /// Number of notes
    pub length: usize,
    /// Semitones between consecutive notes (negative descends)
    pub step: i32,
    pub duration: NoteDuration,
    pub velocity: u8,
    pub program: u8,
    pub qpm: f64,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            tonic: 60,
            length: 16,
            step: 2,
            duration: NoteDuration::default(),
            velocity: DEFAULT_VELOCITY,
            program: 0,
            qpm: DEFAULT_QPM,
        }
    }
}

/// `length` notes from `tonic`, `step` semitones apart, end-to-end
pub fn arithmetic_scale(params: &ScaleParams) -> Result<Passage, TimeGridError> {
    let tempo = Tempo::new(params.qpm)?;
    let duration = params.duration.to_seconds(tempo);

    let mut cursor = Cursor::new();
    let mut pitch = params.tonic;
    for _ in 0..params.length {
        cursor.push(pitch, duration, params.velocity, params.program);
        pitch = pitch.saturating_add(params.step);
    }
    cursor.finish(tempo)
}

/// Parameters for `arpeggio`
#[derive(Debug, Clone, PartialEq)]
pub struct ArpeggioParams {
    pub chord: Vec<i32>,
    pub cycles: usize,
    pub duration: NoteDuration,
    pub velocity: u8,
    pub program: u8,
    pub qpm: f64,
}

impl Default for ArpeggioParams {
    fn default() -> Self {
        Self {
            chord: vec![60, 64, 67, 72],
            cycles: 4,
            duration: NoteDuration::default(),
            velocity: DEFAULT_VELOCITY,
            program: 0,
            qpm: DEFAULT_QPM,
        }
    }
}

/// The chord played in order, `cycles` times
pub fn arpeggio(params: &ArpeggioParams) -> Result<Passage, TimeGridError> {
    let tempo = Tempo::new(params.qpm)?;
    let duration = params.duration.to_seconds(tempo);

    let mut cursor = Cursor::new();
    for _ in 0..params.cycles {
        for &pitch in &params.chord {
            cursor.push(pitch, duration, params.velocity, params.program);
        }
    }
    cursor.finish(tempo)
}

/// Parameters for `major_scale`
#[derive(Debug, Clone, PartialEq)]
pub struct MajorScaleParams {
    pub tonic: i32,
    pub octaves: usize,
    pub duration: NoteDuration,
    pub velocity: u8,
    pub program: u8,
    pub qpm: f64,
}

impl Default for MajorScaleParams {
    fn default() -> Self {
        Self {
            tonic: 60,
            octaves: 1,
            // Sixteenth notes
            duration: NoteDuration::Beats(0.25),
            velocity: DEFAULT_VELOCITY,
            program: 0,
            qpm: DEFAULT_QPM,
        }
    }
}

/// Ascending major scale: the tonic, then 7 notes per octave ending on the upper tonic
pub fn major_scale(params: &MajorScaleParams) -> Result<Passage, TimeGridError> {
    let tempo = Tempo::new(params.qpm)?;
    let duration = params.duration.to_seconds(tempo);

    let mut cursor = Cursor::new();
    let mut pitch = params.tonic;
    cursor.push(pitch, duration, params.velocity, params.program);
    for _ in 0..params.octaves {
        for interval in MAJOR_PATTERN {
            pitch = pitch.saturating_add(interval);
            cursor.push(pitch, duration, params.velocity, params.program);
        }
    }
    cursor.finish(tempo)
}
