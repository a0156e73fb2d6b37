// External collaborators - Generative model services and seed shaping

pub mod runner;
pub mod seed;
pub mod service;

pub use runner::run_model;
pub use seed::{
    DEFAULT_MODEL_PITCH_RANGE, SeedOptions, append_continuation, as_voice, fold_into_range,
    prepare_seed, to_monophonic,
};
pub use service::{ExternalError, GenerationKind, GenerationRequest, ModelError, ModelService};
