// notegrid - Note-sequence workshop core: time grid, builders, track mix and file formats

pub mod builders;
pub mod command;
pub mod config;
pub mod external;
pub mod interchange;
pub mod messaging;
pub mod midi;
pub mod mix;
pub mod project;
pub mod sequencer;
pub mod workshop;

// Re-export commonly used types for convenience
pub use command::{CommandManager, UndoableCommand};
pub use config::{ConfigError, WorkshopConfig};
pub use external::{ExternalError, GenerationRequest, ModelError, ModelService, run_model};
pub use interchange::{InterchangeError, RawNoteSequence};
pub use messaging::{Notification, NotificationCategory, NotificationLevel};
pub use mix::{MixError, MixListener, Track, TrackId, TrackMeta, TrackMixManager};
pub use sequencer::{
    ConcatOptions, Note, Passage, Tempo, TimeGrid, TimeGridError, concatenate, merge, normalize,
    reconcile, trim,
};
pub use workshop::{Workshop, WorkshopError};
