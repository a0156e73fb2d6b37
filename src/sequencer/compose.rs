// Compositor - Combine passages in parallel (merge) or in sequence (concatenate)

use crate::sequencer::normalize::normalize;
use crate::sequencer::passage::{Passage, TempoMarker};
use crate::sequencer::reconcile::{quantize, unquantize};
use crate::sequencer::timeline::{DEFAULT_QPM, Tempo, TimeGrid, TimeGridError};

/// Tolerance when comparing tempos of two passages
const TEMPO_EPSILON: f64 = 1e-9;

/// Reference tempo/grid overrides for `concatenate`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConcatOptions {
    pub qpm: Option<f64>,
    pub steps_per_quarter: Option<u32>,
}

/// Overlay passages so that all their notes sound together.
///
/// Tempo and grid come from the first input declaring them. Inputs should
/// already be reconciled; a differing tempo is kept out of the result and
/// only logged.
pub fn merge(passages: &[Passage]) -> Result<Passage, TimeGridError> {
    let qpm = passages
        .iter()
        .find_map(|p| p.qpm())
        .unwrap_or(DEFAULT_QPM);
    let steps_per_quarter = passages.iter().find_map(|p| p.steps_per_quarter);

    let mut notes = Vec::with_capacity(passages.iter().map(Passage::note_count).sum());
    let mut total_time: f64 = 0.0;
    for passage in passages {
        // Resolve each input on its own metadata first (step-only notes)
        let resolved = normalize(passage)?;
        if let Some(other) = passage.qpm()
            && (other - qpm).abs() > TEMPO_EPSILON
        {
            log::warn!(
                "Merging passage at {} QPM into {} QPM; keeping the first tempo",
                other,
                qpm
            );
        }
        total_time = total_time.max(resolved.total_time);
        notes.extend(resolved.notes.into_iter().map(|mut note| {
            note.quantized_start_step = None;
            note.quantized_end_step = None;
            note
        }));
    }

    normalize(&Passage {
        notes,
        tempos: vec![TempoMarker::at_start(qpm)],
        steps_per_quarter,
        total_time,
        total_steps: None,
    })
}

/// Place passages one after another on a shared tempo and grid.
///
/// Fewer than two inputs is a no-op: nothing yields an empty passage and a
/// single passage is returned unchanged.
pub fn concatenate(
    passages: &[Passage],
    options: &ConcatOptions,
) -> Result<Passage, TimeGridError> {
    match passages {
        [] => return normalize(&Passage::new()),
        [only] => return Ok(only.clone()),
        _ => {}
    }

    let reference = Tempo::new(
        options
            .qpm
            .or_else(|| passages.iter().find_map(|p| p.qpm()))
            .unwrap_or(DEFAULT_QPM),
    )?;
    let steps_per_quarter = options
        .steps_per_quarter
        .or_else(|| passages.iter().find_map(|p| p.steps_per_quarter));
    let grid = match steps_per_quarter {
        Some(spq) => Some(TimeGrid::new(reference.qpm(), spq)?),
        None => None,
    };

    let mut notes = Vec::new();
    let mut offset_seconds = 0.0;
    let mut offset_steps: u32 = 0;

    for passage in passages {
        let piece = align(passage, reference, steps_per_quarter)?;
        notes.extend(piece.notes.iter().map(|n| n.shifted(offset_seconds)));

        match (grid, piece.total_steps) {
            (Some(grid), Some(steps)) => {
                offset_steps = offset_steps.saturating_add(steps);
                offset_seconds = grid.step_to_seconds(offset_steps);
            }
            _ => offset_seconds += piece.total_time,
        }
    }

    let mut out = Passage {
        notes,
        tempos: vec![TempoMarker::at_start(reference.qpm())],
        steps_per_quarter,
        total_time: offset_seconds,
        total_steps: None,
    };
    if grid.is_some() {
        out.total_steps = Some(offset_steps);
    }
    normalize(&out)
}

/// Retime a passage to `reference` (preserving beats) and put it on the target grid
fn align(
    passage: &Passage,
    reference: Tempo,
    steps_per_quarter: Option<u32>,
) -> Result<Passage, TimeGridError> {
    let mut piece = unquantize(passage)?;
    let own = piece.tempo()?;

    if (own.qpm() - reference.qpm()).abs() > TEMPO_EPSILON {
        let scale = own.qpm() / reference.qpm();
        for note in piece.notes.iter_mut() {
            note.start_time *= scale;
            note.end_time *= scale;
        }
        piece.total_time *= scale;
        log::debug!("Retimed passage from {} to {} for concatenation", own, reference);
    }
    piece.tempos = vec![TempoMarker::at_start(reference.qpm())];

    match steps_per_quarter {
        Some(spq) => quantize(&piece, spq),
        None => normalize(&piece),
    }
}

/// Excerpt of `passage` covering `[start, end)` seconds, shifted to time zero.
///
/// Notes starting inside the window are kept and clipped at `end`.
pub fn trim(passage: &Passage, start: f64, end: f64) -> Result<Passage, TimeGridError> {
    let resolved = normalize(passage)?;
    let start = start.max(0.0);
    let end = end.min(resolved.total_time);

    let mut out = Passage {
        notes: Vec::new(),
        tempos: resolved.tempos.clone(),
        steps_per_quarter: resolved.steps_per_quarter,
        total_time: 0.0,
        total_steps: None,
    };
    if end > start {
        out.notes = resolved
            .notes
            .iter()
            .filter(|n| n.start_time >= start && n.start_time < end)
            .map(|n| {
                let mut clipped = n.shifted(-start);
                clipped.end_time = clipped.end_time.min(end - start);
                clipped
            })
            .collect();
        out.total_time = end - start;
    }
    normalize(&out)
}
