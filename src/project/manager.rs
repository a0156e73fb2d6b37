// Session manager for saving and loading whole workshops

use crate::mix::{MixError, TrackId, TrackMixManager};
use crate::project::serialization::*;
use crate::project::types::*;
use crate::sequencer::timeline::{DEFAULT_QPM, TimeGridError};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::{ZipArchive, ZipWriter};

const MANIFEST_NAME: &str = "manifest.json";
const TRACKS_DIR: &str = "tracks";

/// Session archive errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session archive has no manifest")]
    MissingManifest,

    #[error("Session format version {0} is not supported")]
    UnsupportedVersion(u32),

    #[error("Track file '{file}': {source}")]
    Track {
        file: String,
        #[source]
        source: TrackIoError,
    },

    #[error(transparent)]
    Grid(#[from] TimeGridError),

    #[error(transparent)]
    Mix(#[from] MixError),
}

/// Saves and loads session archives: a manifest plus one track file per track
pub struct SessionManager {
    app_name: String,
}

impl SessionManager {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Write every track of `mix` to a zip archive at `path`.
    ///
    /// Overwriting an existing session keeps its creation time.
    pub fn save<P: AsRef<Path>>(
        &self,
        path: P,
        title: &str,
        mix: &TrackMixManager,
    ) -> Result<SessionManifest, SessionError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }

        let now = chrono::Utc::now().to_rfc3339();
        let created = if path.exists() {
            read_manifest(path).map(|m| m.created).unwrap_or_else(|_| now.clone())
        } else {
            now.clone()
        };

        let current = mix.current();
        let manifest = SessionManifest {
            title: title.to_string(),
            format_version: SESSION_FORMAT_VERSION,
            app: self.app_name.clone(),
            created,
            modified: now,
            qpm: current.qpm().unwrap_or(DEFAULT_QPM),
            spq: current.steps_per_quarter,
            track_count: mix.track_count(),
        };

        let mut zip_writer = ZipWriter::new(File::create(path)?);
        let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
        zip_writer.start_file(MANIFEST_NAME, options)?;
        zip_writer.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

        for (index, track) in mix.tracks().iter().enumerate() {
            let name = format!("{}/{:02}_{}", TRACKS_DIR, index, track_file_name(&track.name));
            let file = serialize_track(track, &self.app_name)?;
            let json = track_to_json(&file).map_err(|source| SessionError::Track {
                file: name.clone(),
                source,
            })?;
            let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
            zip_writer.start_file(&*name, options)?;
            zip_writer.write_all(json.as_bytes())?;
        }

        zip_writer.finish()?;
        log::info!(
            "Saved session '{}' ({} tracks) to {}",
            title,
            manifest.track_count,
            path.display()
        );
        Ok(manifest)
    }

    /// Read a session archive; tracks come back in saved order
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Session, SessionError> {
        let mut archive = ZipArchive::new(File::open(path.as_ref())?)?;
        let manifest = manifest_from_archive(&mut archive)?;

        let mut names: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with(TRACKS_DIR) && n.ends_with(TRACK_FILE_EXTENSION))
            .map(str::to_string)
            .collect();
        names.sort();

        let mut tracks = Vec::with_capacity(names.len());
        for name in names {
            let mut json = String::new();
            archive.by_name(&name)?.read_to_string(&mut json)?;
            let track = track_from_json(&json).map_err(|source| SessionError::Track {
                file: name.clone(),
                source,
            })?;
            tracks.push(track);
        }

        if tracks.len() != manifest.track_count {
            log::warn!(
                "Session manifest lists {} tracks but the archive holds {}",
                manifest.track_count,
                tracks.len()
            );
        }

        Ok(Session { manifest, tracks })
    }

    /// Replace the tracks of `mix` with the session's tracks
    pub fn restore_into(
        &self,
        session: &Session,
        mix: &mut TrackMixManager,
    ) -> Result<Vec<TrackId>, SessionError> {
        mix.clear();
        let mut ids = Vec::with_capacity(session.tracks.len());
        for loaded in &session.tracks {
            let id = mix.add_track(&loaded.passage, loaded.meta.clone())?;
            if !loaded.is_active {
                mix.set_active(id, false)?;
            }
            ids.push(id);
        }
        Ok(ids)
    }
}

fn read_manifest(path: &Path) -> Result<SessionManifest, SessionError> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    manifest_from_archive(&mut archive)
}

fn manifest_from_archive(archive: &mut ZipArchive<File>) -> Result<SessionManifest, SessionError> {
    let mut json = String::new();
    match archive.by_name(MANIFEST_NAME) {
        Ok(mut file) => {
            file.read_to_string(&mut json)?;
        }
        Err(zip::result::ZipError::FileNotFound) => return Err(SessionError::MissingManifest),
        Err(e) => return Err(e.into()),
    }

    let manifest: SessionManifest = serde_json::from_str(&json)?;
    if manifest.format_version > SESSION_FORMAT_VERSION {
        return Err(SessionError::UnsupportedVersion(manifest.format_version));
    }
    Ok(manifest)
}
