// Mix module - Track collection and the composite "current" passage

pub mod manager;
pub mod split;
pub mod track;

pub use manager::{MixError, MixListener, TrackMixManager};
pub use split::{TrackPart, split_into_parts};
pub use track::{Track, TrackId, TrackMeta};
