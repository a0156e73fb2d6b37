// Serialization utilities for portable track files

use crate::interchange::{InterchangeError, RawNoteSequence};
use crate::mix::Track;
use crate::project::migration::TrackMigrator;
use crate::project::types::*;
use crate::sequencer::normalize::normalize;
use crate::sequencer::timeline::{Tempo, TimeGridError};
use serde_json::Value;
use std::path::Path;

/// Track file errors
#[derive(Debug, thiserror::Error)]
pub enum TrackIoError {
    #[error("Track file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown track file format (type = {0})")]
    UnknownFormat(String),

    #[error("Track file has no note sequence")]
    MissingPassage,

    #[error("Track file version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Track file note sequence is invalid: {0}")]
    InvalidPassage(#[from] InterchangeError),

    #[error(transparent)]
    Grid(#[from] TimeGridError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Make a track name safe to use as a file name
pub fn sanitize_file_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return "track".to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match c {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => out.push('-'),
            _ => out.extend(c.to_lowercase()),
        }
    }
    out
}

/// `<sanitized name>.magtrack`
pub fn track_file_name(name: &str) -> String {
    format!("{}.{}", sanitize_file_name(name), TRACK_FILE_EXTENSION)
}

/// Package a track as a portable track file
pub fn serialize_track(track: &Track, app: &str) -> Result<TrackFile, TimeGridError> {
    let passage = normalize(&track.passage)?;
    let qpm = passage.tempo()?.qpm();

    Ok(TrackFile {
        kind: TRACK_FILE_TYPE.to_string(),
        version: TRACK_FORMAT_VERSION,
        app: app.to_string(),
        saved_at: chrono::Utc::now().to_rfc3339(),
        meta: TrackFileMeta {
            name: track.name.clone(),
            program: track.program,
            is_drum: track.is_drum,
            preserve_instruments: track.preserve_instruments,
            is_active: track.is_active,
            qpm,
            spq: passage.steps_per_quarter,
        },
        ns: RawNoteSequence::from(&passage),
    })
}

pub fn track_to_json(file: &TrackFile) -> Result<String, TrackIoError> {
    Ok(serde_json::to_string(file)?)
}

/// Parse, migrate and validate a track file
pub fn track_from_json(json: &str) -> Result<LoadedTrack, TrackIoError> {
    let value: Value = serde_json::from_str(json)?;

    match value.get("type").and_then(Value::as_str) {
        Some(TRACK_FILE_TYPE) => {}
        Some(other) => return Err(TrackIoError::UnknownFormat(other.to_string())),
        None => return Err(TrackIoError::UnknownFormat("missing".to_string())),
    }
    if value.get("ns").is_none_or(Value::is_null) {
        return Err(TrackIoError::MissingPassage);
    }

    // Files written before versioning carry no version field
    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .map_or(1, |v| u32::try_from(v).unwrap_or(u32::MAX));

    let migration = TrackMigrator::migrate_to_current(value, version)?;
    for message in &migration.messages {
        log::info!("{}", message);
    }

    let file: TrackFile = serde_json::from_value(migration.value)?;
    let mut passage = file.ns.into_passage()?;
    if passage.tempos.is_empty()
        && let Ok(tempo) = Tempo::new(file.meta.qpm)
    {
        passage = passage.with_tempo(tempo.qpm());
    }

    Ok(LoadedTrack {
        meta: file.meta.track_meta(),
        is_active: file.meta.is_active,
        passage: normalize(&passage)?,
        source_version: version,
    })
}

pub fn save_track_file<P: AsRef<Path>>(
    path: P,
    track: &Track,
    app: &str,
) -> Result<(), TrackIoError> {
    let json = track_to_json(&serialize_track(track, app)?)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_track_file<P: AsRef<Path>>(path: P) -> Result<LoadedTrack, TrackIoError> {
    let json = std::fs::read_to_string(path)?;
    track_from_json(&json)
}
