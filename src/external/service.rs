// Model service seam - Generative models are injected collaborators
//
// Inference itself lives outside this crate. A service receives a normalized
// seed and returns loosely typed note sequences; run_model validates them
// before anything else sees them.

use crate::interchange::{InterchangeError, RawNoteSequence};
use crate::sequencer::passage::Passage;
use crate::sequencer::timeline::TimeGridError;
use std::fmt;

/// What the model is asked to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GenerationKind {
    /// Extend the seed by `steps` grid steps
    Continue { steps: u32 },
    /// Draw `count` samples from the prior (the seed is ignored)
    Sample { count: u32 },
    /// Fill in voices around the seed
    Harmonize { iterations: u32 },
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationKind::Continue { .. } => write!(f, "continue"),
            GenerationKind::Sample { .. } => write!(f, "sample"),
            GenerationKind::Harmonize { .. } => write!(f, "harmonize"),
        }
    }
}

/// Generation parameters, opaque to the core apart from the kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub temperature: f64,
}

impl GenerationRequest {
    pub fn continuation(steps: u32, temperature: f64) -> Self {
        Self {
            kind: GenerationKind::Continue { steps },
            temperature,
        }
    }

    pub fn sample(count: u32, temperature: f64) -> Self {
        Self {
            kind: GenerationKind::Sample { count },
            temperature,
        }
    }

    pub fn harmonize(iterations: u32, temperature: f64) -> Self {
        Self {
            kind: GenerationKind::Harmonize { iterations },
            temperature,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Unsupported request: {0}")]
    Unsupported(GenerationKind),

    #[error("Unusable model output: {0}")]
    Output(#[from] InterchangeError),

    #[error(transparent)]
    Grid(#[from] TimeGridError),
}

/// A generative model (RNN continuation, VAE sampling, harmonizer, ...)
pub trait ModelService {
    /// Short label used in error reports (e.g. "Melody RNN")
    fn name(&self) -> &str;

    /// Run the model on a normalized seed
    fn generate(
        &mut self,
        seed: &Passage,
        request: &GenerationRequest,
    ) -> Result<Vec<RawNoteSequence>, ModelError>;
}

/// A producer failed; `operation` names the action that triggered it
#[derive(Debug, thiserror::Error)]
pub enum ExternalError {
    #[error("{operation} failed: {source}")]
    Producer {
        operation: String,
        #[source]
        source: ModelError,
    },
}

impl ExternalError {
    pub fn producer(operation: impl Into<String>, source: impl Into<ModelError>) -> Self {
        ExternalError::Producer {
            operation: operation.into(),
            source: source.into(),
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            ExternalError::Producer { operation, .. } => operation,
        }
    }
}
