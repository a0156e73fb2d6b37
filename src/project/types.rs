// Types for track files and session archives

use serde::{Deserialize, Serialize};

use crate::interchange::RawNoteSequence;
use crate::mix::TrackMeta;
use crate::sequencer::passage::Passage;

/// Tag carried by every portable track file
pub const TRACK_FILE_TYPE: &str = "magtrack";

/// Extension used for track files, inside and outside session archives
pub const TRACK_FILE_EXTENSION: &str = "magtrack";

/// Current track file version (v2 added `isActive`)
pub const TRACK_FORMAT_VERSION: u32 = 2;

/// Current session archive version
pub const SESSION_FORMAT_VERSION: u32 = 1;

/// Track metadata as stored in a track file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackFileMeta {
    pub name: String,
    #[serde(default)]
    pub program: u8,
    #[serde(default)]
    pub is_drum: bool,
    #[serde(default)]
    pub preserve_instruments: bool,
    /// Added in v2
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub qpm: f64,
    #[serde(default)]
    pub spq: Option<u32>,
}

fn default_active() -> bool {
    true
}

impl TrackFileMeta {
    pub fn track_meta(&self) -> TrackMeta {
        TrackMeta {
            name: self.name.clone(),
            program: self.program,
            is_drum: self.is_drum,
            preserve_instruments: self.preserve_instruments,
        }
    }
}

/// A portable track: one passage plus its track metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackFile {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    #[serde(default)]
    pub app: String,
    /// RFC 3339
    #[serde(default)]
    pub saved_at: String,
    pub meta: TrackFileMeta,
    pub ns: RawNoteSequence,
}

/// A track file after validation
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTrack {
    pub meta: TrackMeta,
    pub is_active: bool,
    /// Normalized
    pub passage: Passage,
    /// Version found in the file, before migration
    pub source_version: u32,
}

/// `manifest.json` of a session archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionManifest {
    pub title: String,
    pub format_version: u32,
    pub app: String,
    /// RFC 3339
    pub created: String,
    /// RFC 3339
    pub modified: String,
    pub qpm: f64,
    #[serde(default)]
    pub spq: Option<u32>,
    pub track_count: usize,
}

/// Everything read back from a session archive
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub manifest: SessionManifest,
    pub tracks: Vec<LoadedTrack>,
}
