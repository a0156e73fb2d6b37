// Model runner - Seed in, validated passages out

use crate::external::service::{ExternalError, GenerationRequest, ModelError, ModelService};
use crate::sequencer::normalize::{NormalizeOptions, normalize, normalize_with};
use crate::sequencer::passage::Passage;
use crate::sequencer::reconcile::{reconcile, reconcile_to};

/// Run one model call.
///
/// The seed is normalized onto `grid` (when given) before the call. Every
/// returned sequence is validated and normalized; with a `grid` the results
/// are reconciled onto it, otherwise onto the first declared grid among
/// them. The call is made once; any failure is reported under the
/// service's name.
pub fn run_model<S: ModelService + ?Sized>(
    service: &mut S,
    seed: &Passage,
    request: &GenerationRequest,
    grid: Option<u32>,
) -> Result<Vec<Passage>, ExternalError> {
    let operation = format!("{} ({})", service.name(), request.kind);
    let fail = |source: ModelError| ExternalError::producer(operation.clone(), source);

    let options = match grid {
        Some(spq) => NormalizeOptions::with_grid(spq),
        None => NormalizeOptions::default(),
    };
    let seed = normalize_with(seed, &options).map_err(|e| fail(e.into()))?;

    let outputs = service.generate(&seed, request).map_err(&fail)?;
    log::debug!("{} returned {} sequence(s)", operation, outputs.len());

    let passages = outputs
        .into_iter()
        .map(|raw| {
            let passage = raw.into_passage()?;
            Ok(normalize(&passage)?)
        })
        .collect::<Result<Vec<Passage>, ModelError>>()
        .map_err(fail)?;

    Ok(match grid {
        Some(spq) => reconcile_to(&passages, spq),
        None => reconcile(&passages),
    })
}
