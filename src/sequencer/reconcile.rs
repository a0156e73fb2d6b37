// Grid reconciler - Bring a set of passages onto one step grid
// The first passage declaring a grid resolution sets the target for the rest

use crate::sequencer::normalize::normalize;
use crate::sequencer::passage::Passage;
use crate::sequencer::timeline::{GridResolution, TimeGridError};

/// A single passage could not be brought onto the target grid.
///
/// Reconciliation never aborts the batch: the failing passage is passed
/// through unmodified and the error is logged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconcileError {
    #[error("Passage has an unusable time grid: {0}")]
    InvalidSource(TimeGridError),

    #[error("Cannot requantize onto {spq} steps/quarter: {source}")]
    InvalidTarget { spq: u32, source: TimeGridError },
}

/// Reconcile passages onto the grid of the first one that declares a grid.
///
/// Output has the same length and order as the input. With no declared grid
/// at all, the passages are returned as-is.
pub fn reconcile(passages: &[Passage]) -> Vec<Passage> {
    match passages.iter().find_map(|p| p.steps_per_quarter) {
        Some(target) => reconcile_to(passages, target),
        None => passages.to_vec(),
    }
}

/// Reconcile passages onto an explicit grid resolution
pub fn reconcile_to(passages: &[Passage], steps_per_quarter: u32) -> Vec<Passage> {
    passages
        .iter()
        .enumerate()
        .map(|(index, passage)| {
            if passage.steps_per_quarter == Some(steps_per_quarter) {
                return passage.clone();
            }
            match reconcile_passage(passage, steps_per_quarter) {
                Ok(reconciled) => reconciled,
                Err(e) => {
                    log::warn!("Passage {} left on its own grid: {}", index, e);
                    passage.clone()
                }
            }
        })
        .collect()
}

/// Move one passage onto `steps_per_quarter`.
///
/// A passage on another grid is first unquantized with its own tempo and
/// resolution, then requantized; a free-time passage is quantized directly.
pub fn reconcile_passage(
    passage: &Passage,
    steps_per_quarter: u32,
) -> Result<Passage, ReconcileError> {
    GridResolution::new(steps_per_quarter).map_err(|source| ReconcileError::InvalidTarget {
        spq: steps_per_quarter,
        source,
    })?;

    let unquantized = unquantize(passage).map_err(ReconcileError::InvalidSource)?;
    quantize(&unquantized, steps_per_quarter).map_err(|source| ReconcileError::InvalidTarget {
        spq: steps_per_quarter,
        source,
    })
}

/// Quantize a passage onto `steps_per_quarter`, replacing any existing grid.
///
/// Times stay authoritative; only the step mirror and totals change.
pub fn quantize(passage: &Passage, steps_per_quarter: u32) -> Result<Passage, TimeGridError> {
    // Resolve step-only notes on the current grid before switching grids
    let mut out = normalize(passage)?;
    out.steps_per_quarter = Some(steps_per_quarter);
    out.total_steps = None;
    for note in out.notes.iter_mut() {
        note.quantized_start_step = None;
        note.quantized_end_step = None;
    }
    normalize(&out)
}

/// Drop the grid from a passage, keeping the note times it implies
pub fn unquantize(passage: &Passage) -> Result<Passage, TimeGridError> {
    let mut out = normalize(passage)?;
    out.steps_per_quarter = None;
    out.total_steps = None;
    normalize(&out)
}
