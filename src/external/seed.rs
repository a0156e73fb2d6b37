// Seed preparation - Shape passages the way melody models expect them

use crate::sequencer::normalize::{NormalizeOptions, normalize, normalize_with};
use crate::sequencer::note::MIDI_MAX;
use crate::sequencer::passage::{Passage, TempoMarker, presentation_order};
use crate::sequencer::reconcile::quantize;
use crate::sequencer::timeline::{Tempo, TimeGridError};

/// Pitch range of melody models when the checkpoint does not declare one
pub const DEFAULT_MODEL_PITCH_RANGE: (u8, u8) = (36, 96);

/// How to prepare a seed for a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedOptions {
    pub steps_per_quarter: u32,
    pub qpm: f64,
    /// Drop overlapping notes (melody models are monophonic)
    pub monophonic: bool,
    pub pitch_range: (u8, u8),
}

impl SeedOptions {
    pub fn new(qpm: f64, steps_per_quarter: u32) -> Self {
        Self {
            steps_per_quarter,
            qpm,
            monophonic: true,
            pitch_range: DEFAULT_MODEL_PITCH_RANGE,
        }
    }
}

/// Keep only notes that start after the previous kept note ended
pub fn to_monophonic(passage: &Passage) -> Passage {
    let mut notes = passage.notes.clone();
    notes.sort_by(presentation_order);

    let mut last_end = f64::NEG_INFINITY;
    let mut kept = Vec::with_capacity(notes.len());
    for note in notes {
        if note.start_time >= last_end {
            last_end = note.end_time;
            kept.push(note);
        }
    }
    Passage {
        notes: kept,
        ..passage.clone()
    }
}

/// Move each pitch by octaves until it lies in `[min, max]`.
///
/// With a range narrower than an octave a pitch may still end up outside it.
pub fn fold_into_range(passage: &Passage, min: u8, max: u8) -> Passage {
    let mut out = passage.clone();
    for note in out.notes.iter_mut() {
        let mut pitch = note.pitch;
        while pitch < min && pitch + 12 <= MIDI_MAX {
            pitch += 12;
        }
        while pitch > max && pitch >= 12 {
            pitch -= 12;
        }
        note.pitch = pitch;
    }
    out
}

/// Quantize, optionally make monophonic, fold into range and apply the tempo
pub fn prepare_seed(passage: &Passage, options: &SeedOptions) -> Result<Passage, TimeGridError> {
    let tempo = Tempo::new(options.qpm)?;
    let quantized = quantize(passage, options.steps_per_quarter)?;
    let base = if options.monophonic {
        to_monophonic(&quantized)
    } else {
        quantized
    };
    let (min, max) = options.pitch_range;
    let folded = fold_into_range(&base, min, max);
    normalize(&folded.with_tempo(tempo.qpm()))
}

/// Seed followed by a continuation that starts at time zero.
///
/// The seed's tempo and grid are kept.
pub fn append_continuation(
    seed: &Passage,
    continuation: &Passage,
) -> Result<Passage, TimeGridError> {
    let seed = normalize(seed)?;
    let offset = seed.total_time;

    let mut notes = seed.notes.clone();
    notes.extend(continuation.notes.iter().map(|n| n.shifted(offset)));
    let end = continuation
        .notes
        .iter()
        .fold(0.0_f64, |mx, n| mx.max(n.end_time + offset));

    let out = Passage {
        notes,
        tempos: vec![TempoMarker::at_start(seed.tempo()?.qpm())],
        steps_per_quarter: seed.steps_per_quarter,
        total_time: seed.total_time.max(end),
        total_steps: None,
    };
    normalize_with(&out, &NormalizeOptions::default())
}

/// Tag every note with a voice index (0 = soprano ... 3 = bass)
pub fn as_voice(passage: &Passage, voice: u32) -> Passage {
    let mut out = passage.clone();
    for note in out.notes.iter_mut() {
        note.instrument = Some(voice);
    }
    out
}
