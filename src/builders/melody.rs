// Melody - Passages from explicit pitch lists and absolute-time event lists

use crate::builders::{Cursor, NoteDuration, midi_pitch};
use crate::sequencer::normalize::normalize;
use crate::sequencer::note::{DEFAULT_VELOCITY, Note};
use crate::sequencer::passage::Passage;
use crate::sequencer::timeline::{DEFAULT_QPM, Tempo, TimeGridError};

/// A note with per-note overrides of the shared defaults
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MelodyNote {
    pub pitch: i32,
    pub duration_seconds: Option<f64>,
    pub duration_beats: Option<f64>,
    pub velocity: Option<u8>,
    pub program: Option<u8>,
}

impl MelodyNote {
    pub fn new(pitch: i32) -> Self {
        Self {
            pitch,
            ..Self::default()
        }
    }

    pub fn seconds(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn beats(mut self, beats: f64) -> Self {
        self.duration_beats = Some(beats);
        self
    }

    pub fn velocity(mut self, velocity: u8) -> Self {
        self.velocity = Some(velocity);
        self
    }
}

/// One entry of a melody: a bare pitch or a note with overrides
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MelodyItem {
    Pitch(i32),
    Note(MelodyNote),
}

impl From<i32> for MelodyItem {
    fn from(pitch: i32) -> Self {
        MelodyItem::Pitch(pitch)
    }
}

impl From<MelodyNote> for MelodyItem {
    fn from(note: MelodyNote) -> Self {
        MelodyItem::Note(note)
    }
}

/// Parameters for `melody`
#[derive(Debug, Clone, PartialEq)]
pub struct MelodyParams {
    pub items: Vec<MelodyItem>,
    /// Shared duration for items without their own
    pub duration: NoteDuration,
    pub velocity: u8,
    pub program: u8,
    pub qpm: f64,
}

impl MelodyParams {
    pub fn from_pitches(pitches: &[i32]) -> Self {
        Self {
            items: pitches.iter().map(|&p| MelodyItem::Pitch(p)).collect(),
            ..Self::default()
        }
    }
}

impl Default for MelodyParams {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            duration: NoteDuration::default(),
            velocity: DEFAULT_VELOCITY,
            program: 0,
            qpm: DEFAULT_QPM,
        }
    }
}

/// Sequential melody, notes laid end-to-end in item order.
///
/// Duration resolves as explicit seconds, then explicit beats, then the
/// shared default.
pub fn melody(params: &MelodyParams) -> Result<Passage, TimeGridError> {
    let tempo = Tempo::new(params.qpm)?;
    let shared = params.duration.to_seconds(tempo);

    let mut cursor = Cursor::new();
    for item in &params.items {
        match item {
            MelodyItem::Pitch(pitch) => {
                cursor.push(*pitch, shared, params.velocity, params.program);
            }
            MelodyItem::Note(note) => {
                let duration = resolve_duration(
                    note.duration_seconds,
                    note.duration_beats,
                    shared,
                    tempo,
                );
                cursor.push(
                    note.pitch,
                    duration,
                    note.velocity.unwrap_or(params.velocity),
                    note.program.unwrap_or(params.program),
                );
            }
        }
    }
    cursor.finish(tempo)
}

/// An event placed at an absolute position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimedEvent {
    pub pitch: i32,
    pub start_seconds: Option<f64>,
    pub start_beats: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub duration_beats: Option<f64>,
    pub velocity: Option<u8>,
    pub program: Option<u8>,
}

impl TimedEvent {
    pub fn at_seconds(pitch: i32, start: f64, duration: f64) -> Self {
        Self {
            pitch,
            start_seconds: Some(start),
            duration_seconds: Some(duration),
            ..Self::default()
        }
    }

    pub fn at_beats(pitch: i32, start: f64, duration: f64) -> Self {
        Self {
            pitch,
            start_beats: Some(start),
            duration_beats: Some(duration),
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = Some(velocity);
        self
    }
}

/// Parameters for `absolute_sequence`
#[derive(Debug, Clone, PartialEq)]
pub struct AbsoluteParams {
    pub events: Vec<TimedEvent>,
    pub duration: NoteDuration,
    pub velocity: u8,
    pub program: u8,
    pub qpm: f64,
}

impl AbsoluteParams {
    pub fn new(events: Vec<TimedEvent>, qpm: f64) -> Self {
        Self {
            events,
            qpm,
            ..Self::default()
        }
    }
}

impl Default for AbsoluteParams {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            duration: NoteDuration::default(),
            velocity: DEFAULT_VELOCITY,
            program: 0,
            qpm: DEFAULT_QPM,
        }
    }
}

/// Passage from independently placed events.
///
/// Events without a usable start are skipped. Output is sorted by start and
/// `total_time` is the latest note end.
pub fn absolute_sequence(params: &AbsoluteParams) -> Result<Passage, TimeGridError> {
    let tempo = Tempo::new(params.qpm)?;
    let shared = params.duration.to_seconds(tempo);

    let notes = params
        .events
        .iter()
        .filter_map(|event| {
            let pitch = midi_pitch(event.pitch)?;
            let start = resolve_start(event, tempo)?;
            let duration = resolve_duration(
                event.duration_seconds,
                event.duration_beats,
                shared,
                tempo,
            );
            Some(
                Note::new(pitch, start, start + duration)
                    .with_velocity(event.velocity.unwrap_or(params.velocity))
                    .with_program(event.program.unwrap_or(params.program)),
            )
        })
        .collect();

    // Degenerate notes are removed by the normalizer
    normalize(&Passage::from_notes(notes, tempo.qpm()))
}

fn resolve_start(event: &TimedEvent, tempo: Tempo) -> Option<f64> {
    event
        .start_seconds
        .filter(|s| s.is_finite())
        .or_else(|| {
            event
                .start_beats
                .filter(|b| b.is_finite())
                .map(|b| tempo.beats_to_seconds(b))
        })
}

fn resolve_duration(seconds: Option<f64>, beats: Option<f64>, shared: f64, tempo: Tempo) -> f64 {
    seconds
        .or_else(|| beats.map(|b| tempo.beats_to_seconds(b)))
        .unwrap_or(shared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_melody_from_bare_pitches() {
        let params = MelodyParams {
            duration: NoteDuration::Beats(0.25),
            ..MelodyParams::from_pitches(&[60, 62, 64, 65])
        };
        let passage = melody(&params).unwrap();

        assert_eq!(passage.note_count(), 4);
        assert_eq!(passage.notes[3].start_time, 0.375);
        assert_eq!(passage.total_time, 0.5);
        assert!(passage.notes.iter().all(|n| n.velocity == DEFAULT_VELOCITY));
    }

    #[test]
    fn test_melody_duration_fallback() {
        let params = MelodyParams {
            items: vec![
                MelodyNote::new(60).seconds(1.0).beats(4.0).into(),
                MelodyNote::new(62).beats(1.0).into(),
                MelodyItem::Pitch(64),
                MelodyNote::new(65).velocity(40).into(),
            ],
            duration: NoteDuration::Seconds(0.25),
            qpm: 120.0,
            ..MelodyParams::default()
        };
        let passage = melody(&params).unwrap();

        let durations: Vec<f64> = passage.notes.iter().map(|n| n.duration()).collect();
        // Seconds win over beats, beats over the shared default
        assert_eq!(durations, vec![1.0, 0.5, 0.25, 0.25]);
        assert_eq!(passage.notes[3].velocity, 40);
        assert_eq!(passage.total_time, 2.0);
    }

    #[test]
    fn test_melody_drops_zero_duration() {
        let params = MelodyParams {
            items: vec![MelodyNote::new(60).seconds(0.0).into(), MelodyItem::Pitch(62)],
            ..MelodyParams::default()
        };
        let passage = melody(&params).unwrap();
        assert_eq!(passage.note_count(), 1);
        assert_eq!(passage.notes[0].start_time, 0.0);
    }

    #[test]
    fn test_absolute_sequence_with_chord() {
        let events = vec![
            TimedEvent::at_beats(60, 0.0, 1.0),
            TimedEvent::at_beats(64, 1.0, 0.5),
            TimedEvent::at_beats(67, 1.5, 0.5),
            TimedEvent::at_beats(67, 2.0, 1.0),
            TimedEvent::at_beats(60, 2.0, 1.0),
            TimedEvent::at_beats(64, 2.0, 1.0),
        ];
        let passage = absolute_sequence(&AbsoluteParams::new(events, 120.0)).unwrap();

        assert_eq!(passage.note_count(), 6);
        assert_eq!(passage.total_time, 1.5);
        // Chord notes sorted by pitch at the same start
        let chord: Vec<u8> = passage.notes[3..].iter().map(|n| n.pitch).collect();
        assert_eq!(chord, vec![60, 64, 67]);
    }

    #[test]
    fn test_absolute_sequence_prefers_seconds() {
        let event = TimedEvent {
            pitch: 60,
            start_seconds: Some(0.2),
            start_beats: Some(4.0),
            duration_seconds: Some(0.1),
            ..TimedEvent::default()
        };
        let passage = absolute_sequence(&AbsoluteParams::new(vec![event], 120.0)).unwrap();
        assert_eq!(passage.notes[0].start_time, 0.2);
        assert!((passage.notes[0].end_time - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_absolute_sequence_skips_unplaceable_events() {
        let events = vec![
            TimedEvent {
                pitch: 60,
                ..TimedEvent::default()
            },
            TimedEvent::at_seconds(62, f64::NAN, 0.5),
            TimedEvent::at_seconds(64, 1.0, -0.5),
            TimedEvent::at_seconds(300, 0.0, 0.5),
            TimedEvent::at_seconds(65, 0.5, 0.5).with_velocity(70),
        ];
        let passage = absolute_sequence(&AbsoluteParams::new(events, 120.0)).unwrap();

        assert_eq!(passage.note_count(), 1);
        assert_eq!(passage.notes[0].pitch, 65);
        assert_eq!(passage.notes[0].velocity, 70);
        assert_eq!(passage.total_time, 1.0);
    }

    #[test]
    fn test_absolute_sequence_shared_duration() {
        let event = TimedEvent {
            pitch: 60,
            start_seconds: Some(0.0),
            ..TimedEvent::default()
        };
        let params = AbsoluteParams {
            events: vec![event],
            duration: NoteDuration::Beats(2.0),
            qpm: 60.0,
            ..AbsoluteParams::default()
        };
        let passage = absolute_sequence(&params).unwrap();
        assert_eq!(passage.total_time, 2.0);
    }
}
