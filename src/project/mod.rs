// Track and session persistence
// Portable `.magtrack` JSON files, bundled into zip session archives

pub mod manager;
pub mod migration;
pub mod serialization;
pub mod types;

pub use manager::{SessionError, SessionManager};
pub use migration::{CompatibilityInfo, MigrationResult, TrackMigrator};
pub use serialization::{
    TrackIoError, load_track_file, sanitize_file_name, save_track_file, serialize_track,
    track_file_name, track_from_json, track_to_json,
};
pub use types::{
    LoadedTrack, SESSION_FORMAT_VERSION, Session, SessionManifest, TRACK_FILE_EXTENSION,
    TRACK_FILE_TYPE, TRACK_FORMAT_VERSION, TrackFile, TrackFileMeta,
};
