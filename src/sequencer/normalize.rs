// Metadata normalizer
//
// Single ingestion-boundary repair step. Whatever produced a passage (builder,
// model, MIDI/track file), running it through `normalize` guarantees:
// - exactly one tempo marker at time 0 (120 QPM when none was given)
// - quantized note fields and total_steps computed from the time fields when
//   a grid resolution is declared
// - total_time >= latest note end, and never below MIN_TOTAL_TIME
// - malformed notes removed, velocity/program resolved into MIDI range
//
// The function is idempotent: normalize(normalize(p)) == normalize(p).

use crate::sequencer::note::{DEFAULT_VELOCITY, MIDI_MAX, Note};
use crate::sequencer::passage::{Passage, TempoMarker, presentation_order};
use crate::sequencer::timeline::{GridResolution, TimeGrid, TimeGridError};

/// Floor for `total_time` so consumers never see an empty time range
pub const MIN_TOTAL_TIME: f64 = 0.001;

/// Options for `normalize_with`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalizeOptions {
    /// Grid resolution to apply when the passage declares none
    pub default_steps_per_quarter: Option<u32>,
}

impl NormalizeOptions {
    pub fn with_grid(steps_per_quarter: u32) -> Self {
        Self {
            default_steps_per_quarter: Some(steps_per_quarter),
        }
    }
}

/// Normalize a passage, keeping it free-time if it declares no grid
pub fn normalize(passage: &Passage) -> Result<Passage, TimeGridError> {
    normalize_with(passage, &NormalizeOptions::default())
}

/// Normalize a passage, falling back to `options` for missing metadata
pub fn normalize_with(
    passage: &Passage,
    options: &NormalizeOptions,
) -> Result<Passage, TimeGridError> {
    let tempo = passage.tempo()?;
    let steps_per_quarter = passage
        .steps_per_quarter
        .or(options.default_steps_per_quarter);
    let grid = match steps_per_quarter {
        Some(spq) => Some(TimeGrid {
            tempo,
            resolution: GridResolution::new(spq)?,
        }),
        None => None,
    };

    let mut notes: Vec<Note> = passage
        .notes
        .iter()
        .filter_map(|note| repair_note(note, grid.as_ref()))
        .collect();
    let dropped = passage.notes.len() - notes.len();
    if dropped > 0 {
        log::debug!("Dropped {} malformed note(s) during normalization", dropped);
    }
    notes.sort_by(presentation_order);

    // A declared horizon is kept when it covers the notes (trailing silence)
    let mut declared_time = if passage.total_time.is_finite() && passage.total_time > 0.0 {
        passage.total_time
    } else {
        0.0
    };
    if let Some(grid) = grid
        && declared_time == 0.0
        && let Some(steps) = passage.total_steps.filter(|s| *s > 0)
    {
        declared_time = grid.step_to_seconds(steps);
    }

    let max_end = notes.iter().fold(0.0_f64, |mx, n| mx.max(n.end_time));
    let mut total_time = declared_time.max(max_end).max(MIN_TOTAL_TIME);

    let mut total_steps = None;
    if let Some(grid) = grid {
        let max_end_step = notes
            .iter()
            .filter_map(|n| n.quantized_end_step)
            .max()
            .unwrap_or(0);
        let steps_from_time = grid.seconds_to_step(total_time);
        // Sub-step notes stretched to one step push the horizon out with them
        if max_end_step > steps_from_time {
            total_time = total_time.max(grid.step_to_seconds(max_end_step));
        }
        total_steps = Some(max_end_step.max(steps_from_time));
    }

    Ok(Passage {
        notes,
        tempos: vec![TempoMarker::at_start(tempo.qpm())],
        steps_per_quarter,
        total_time,
        total_steps,
    })
}

/// Repair a single note, or `None` if it cannot be rendered
fn repair_note(note: &Note, grid: Option<&TimeGrid>) -> Option<Note> {
    if note.pitch > MIDI_MAX {
        return None;
    }

    let mut out = note.clone();
    if !out.has_valid_times() {
        // Step-only notes (synthetic passages) get their times from the grid
        match (grid, out.quantized_start_step, out.quantized_end_step) {
            (Some(grid), Some(start), Some(end)) if end > start => {
                out.start_time = grid.step_to_seconds(start);
                out.end_time = grid.step_to_seconds(end);
            }
            _ => return None,
        }
    }

    out.velocity = resolve_velocity(out.velocity);
    out.program = out.program.min(MIDI_MAX);

    match grid {
        Some(grid) => {
            // Notes past the last representable step cannot be placed
            let end = grid.checked_seconds_to_step(out.end_time)?;
            let start = grid.seconds_to_step(out.start_time);
            // A sounding note never collapses to zero steps
            let end = end.max(start.saturating_add(1));
            out.quantized_start_step = Some(start);
            out.quantized_end_step = Some(end);
        }
        None => {
            out.quantized_start_step = None;
            out.quantized_end_step = None;
        }
    }

    Some(out)
}

fn resolve_velocity(velocity: u8) -> u8 {
    match velocity {
        0 => DEFAULT_VELOCITY,
        v => v.min(MIDI_MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::timeline::DEFAULT_QPM;

    fn loose_passage() -> Passage {
        Passage {
            notes: vec![
                Note::new(64, 0.5, 1.0),
                Note::new(60, 0.0, 0.5).with_velocity(0),
                Note::new(67, 1.0, 1.0),
                Note::new(72, 0.7, 0.9).with_velocity(200).with_program(250),
            ],
            tempos: vec![],
            steps_per_quarter: None,
            total_time: 0.0,
            total_steps: None,
        }
    }

    #[test]
    fn test_single_tempo_marker_with_default() {
        let out = normalize(&loose_passage()).unwrap();
        assert_eq!(out.tempos, vec![TempoMarker::at_start(DEFAULT_QPM)]);

        let mut multi = loose_passage();
        multi.tempos = vec![
            TempoMarker { time: 0.0, qpm: 90.0 },
            TempoMarker { time: 2.0, qpm: 140.0 },
        ];
        let out = normalize(&multi).unwrap();
        assert_eq!(out.tempos, vec![TempoMarker::at_start(90.0)]);
    }

    #[test]
    fn test_zero_duration_note_dropped() {
        let passage = Passage::from_notes(
            vec![Note::new(60, 0.0, 0.5), Note::new(62, 1.0, 1.0)],
            120.0,
        );
        let out = normalize(&passage).unwrap();

        assert_eq!(out.note_count(), 1);
        assert_eq!(out.notes[0].pitch, 60);
        // The dropped note does not extend the horizon
        assert_eq!(out.total_time, 0.5);
    }

    #[test]
    fn test_notes_repaired_and_sorted() {
        let out = normalize(&loose_passage()).unwrap();
        let pitches: Vec<u8> = out.notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60, 64, 72]);

        assert_eq!(out.notes[0].velocity, DEFAULT_VELOCITY);
        assert_eq!(out.notes[2].velocity, 127);
        assert_eq!(out.notes[2].program, 127);
        assert_eq!(out.total_time, 1.0);
        assert_eq!(out.total_steps, None);
    }

    #[test]
    fn test_out_of_range_pitch_dropped() {
        let passage = Passage::from_notes(vec![Note::new(128, 0.0, 1.0)], 120.0);
        let out = normalize(&passage).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_quantized_fields_computed() {
        // 120 QPM, 4 spq -> 0.125 s per step
        let passage = Passage::from_notes(
            vec![Note::new(60, 0.0, 0.5), Note::new(62, 0.5, 0.76)],
            120.0,
        )
        .with_steps_per_quarter(4);
        let out = normalize(&passage).unwrap();

        assert_eq!(out.notes[0].quantized_start_step, Some(0));
        assert_eq!(out.notes[0].quantized_end_step, Some(4));
        assert_eq!(out.notes[1].quantized_start_step, Some(4));
        assert_eq!(out.notes[1].quantized_end_step, Some(6));
        assert_eq!(out.total_steps, Some(6));
    }

    #[test]
    fn test_default_grid_option() {
        let passage = Passage::from_notes(vec![Note::new(60, 0.0, 0.5)], 120.0);
        let out = normalize_with(&passage, &NormalizeOptions::with_grid(4)).unwrap();
        assert_eq!(out.steps_per_quarter, Some(4));
        assert_eq!(out.total_steps, Some(4));

        // A declared grid wins over the default
        let declared = passage.with_steps_per_quarter(2);
        let out = normalize_with(&declared, &NormalizeOptions::with_grid(4)).unwrap();
        assert_eq!(out.steps_per_quarter, Some(2));
    }

    #[test]
    fn test_short_note_keeps_one_step() {
        let passage = Passage::from_notes(vec![Note::new(60, 0.0, 0.01)], 120.0)
            .with_steps_per_quarter(4);
        let out = normalize(&passage).unwrap();
        assert_eq!(out.notes[0].quantized_start_step, Some(0));
        assert_eq!(out.notes[0].quantized_end_step, Some(1));

        // The horizon follows the stretched note so steps and time agree
        let grid = TimeGrid::new(120.0, 4).unwrap();
        assert_eq!(out.total_steps, Some(grid.seconds_to_step(out.total_time)));
        assert_eq!(out.total_time, grid.step_to_seconds(1));
        assert_eq!(normalize(&out).unwrap(), out);
    }

    #[test]
    fn test_note_beyond_last_step_dropped() {
        let passage = Passage::from_notes(
            vec![Note::new(60, 0.0, 0.5), Note::new(62, 1e10, 1e10 + 1.0)],
            120.0,
        )
        .with_steps_per_quarter(4);

        let out = normalize(&passage).unwrap();
        assert_eq!(out.pitches(), vec![60]);
        assert_eq!(normalize(&out).unwrap(), out);
    }

    #[test]
    fn test_step_only_notes_get_times() {
        let passage = Passage {
            notes: vec![Note::from_steps(60, 0, 2), Note::from_steps(62, 2, 4)],
            tempos: vec![TempoMarker::at_start(120.0)],
            steps_per_quarter: Some(4),
            total_time: 0.0,
            total_steps: Some(8),
        };
        let out = normalize(&passage).unwrap();

        assert_eq!(out.notes[1].start_time, 0.25);
        assert_eq!(out.notes[1].end_time, 0.5);
        // Horizon comes from the declared step count
        assert_eq!(out.total_time, 1.0);
        assert_eq!(out.total_steps, Some(8));
    }

    #[test]
    fn test_step_only_notes_without_grid_dropped() {
        let passage = Passage::from_notes(vec![Note::from_steps(60, 0, 2)], 120.0);
        assert!(normalize(&passage).unwrap().is_empty());
    }

    #[test]
    fn test_declared_total_time_kept() {
        let mut passage = Passage::from_notes(vec![Note::new(60, 0.0, 0.5)], 120.0);
        passage.total_time = 2.0;
        assert_eq!(normalize(&passage).unwrap().total_time, 2.0);

        // A stale horizon shorter than the notes is extended
        passage.total_time = 0.25;
        assert_eq!(normalize(&passage).unwrap().total_time, 0.5);
    }

    #[test]
    fn test_empty_passage_floor() {
        let out = normalize(&Passage::new()).unwrap();
        assert!(out.total_time > 0.0);
        assert_eq!(out.total_time, MIN_TOTAL_TIME);

        let out = normalize(&Passage::new().with_steps_per_quarter(4)).unwrap();
        assert!(out.total_time > 0.0);
        assert_eq!(out.total_steps, Some(0));
    }

    #[test]
    fn test_invalid_tempo_fails() {
        let passage = Passage::from_notes(vec![Note::new(60, 0.0, 0.5)], 0.0);
        let err = normalize(&passage).unwrap_err();
        assert!(err.is_invalid_configuration());

        let passage = Passage::from_notes(vec![], 120.0).with_steps_per_quarter(0);
        assert_eq!(
            normalize(&passage).unwrap_err(),
            TimeGridError::InvalidResolution(0)
        );
    }

    #[test]
    fn test_idempotent() {
        let mut with_grid = loose_passage();
        with_grid.steps_per_quarter = Some(6);
        with_grid.tempos = vec![TempoMarker::at_start(90.0)];

        let step_only = Passage {
            notes: vec![Note::from_steps(60, 1, 3), Note::from_steps(67, 0, 9)],
            tempos: vec![TempoMarker::at_start(77.0)],
            steps_per_quarter: Some(3),
            total_time: f64::NAN,
            total_steps: Some(12),
        };

        for passage in [
            loose_passage(),
            with_grid,
            step_only,
            Passage::new(),
            Passage::new().with_steps_per_quarter(12),
        ] {
            let once = normalize(&passage).unwrap();
            let twice = normalize(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_input_not_mutated() {
        let passage = loose_passage();
        let before = passage.clone();
        let _ = normalize(&passage).unwrap();
        assert_eq!(passage, before);
    }
}
