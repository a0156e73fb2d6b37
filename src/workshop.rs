// Workshop - Owned application state behind one facade
//
// Every user action goes through here: mix mutations run as undoable
// commands, producer failures (models, MIDI files, track files) are
// reported as notifications as well as returned.

use crate::command::{
    AddTrackCommand, CommandError, CommandManager, ConcatenateTracksCommand, RemoveTrackCommand,
    RenameTrackCommand, SetInstrumentCommand, ToggleTrackCommand, UndoableCommand,
};
use crate::config::{ConfigError, WorkshopConfig};
use crate::external::{ExternalError, GenerationRequest, ModelService, run_model};
use crate::messaging::{Notification, NotificationCategory, NotificationLog};
use crate::midi::{MidiCodecError, midi_to_passage, passage_to_midi};
use crate::mix::{MixError, MixListener, TrackId, TrackMeta, TrackMixManager};
use crate::project::{
    SessionError, SessionManager, SessionManifest, TrackIoError, serialize_track, track_from_json,
    track_to_json,
};
use crate::sequencer::compose::trim;
use crate::sequencer::normalize::{NormalizeOptions, normalize_with};
use crate::sequencer::passage::Passage;
use crate::sequencer::timeline::TimeGridError;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum WorkshopError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    External(#[from] ExternalError),

    #[error(transparent)]
    Midi(#[from] MidiCodecError),

    #[error(transparent)]
    TrackFile(#[from] TrackIoError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Grid(#[from] TimeGridError),

    #[error(transparent)]
    Mix(#[from] MixError),
}

impl WorkshopError {
    fn category(&self) -> NotificationCategory {
        match self {
            WorkshopError::External(_) => NotificationCategory::Model,
            WorkshopError::Midi(_) => NotificationCategory::MidiFile,
            WorkshopError::TrackFile(_) | WorkshopError::Session(_) => {
                NotificationCategory::TrackFile
            }
            WorkshopError::Config(_)
            | WorkshopError::Command(_)
            | WorkshopError::Grid(_)
            | WorkshopError::Mix(_) => NotificationCategory::Mix,
        }
    }
}

pub struct Workshop {
    config: WorkshopConfig,
    mix: TrackMixManager,
    commands: CommandManager,
    notifications: NotificationLog,
    sessions: SessionManager,
}

impl Workshop {
    pub fn new(config: WorkshopConfig) -> Result<Self, WorkshopError> {
        config.validate()?;
        Ok(Self {
            mix: TrackMixManager::with_tempo(config.qpm)?,
            commands: CommandManager::with_capacity(config.undo_limit),
            notifications: NotificationLog::new(config.notification_capacity),
            sessions: SessionManager::new(config.app_name.clone()),
            config,
        })
    }

    pub fn config(&self) -> &WorkshopConfig {
        &self.config
    }

    pub fn mix(&self) -> &TrackMixManager {
        &self.mix
    }

    pub fn current(&self) -> &Passage {
        self.mix.current()
    }

    pub fn commands(&self) -> &CommandManager {
        &self.commands
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationLog {
        &mut self.notifications
    }

    pub fn add_listener(&mut self, listener: Box<dyn MixListener>) {
        self.mix.add_listener(listener);
    }

    /// Record a failure for the user and hand it back
    fn report<T>(&mut self, result: Result<T, WorkshopError>) -> Result<T, WorkshopError> {
        if let Err(e) = &result {
            log::warn!("{}", e);
            self.notifications
                .push(Notification::error(e.category(), e.to_string()));
        }
        result
    }

    fn on_workshop_grid(&self, passage: &Passage) -> Result<Passage, TimeGridError> {
        normalize_with(
            passage,
            &NormalizeOptions::with_grid(self.config.steps_per_quarter),
        )
    }

    pub fn execute(&mut self, command: Box<dyn UndoableCommand>) -> Result<(), WorkshopError> {
        let result = self
            .commands
            .execute(command, &mut self.mix)
            .map_err(WorkshopError::from);
        self.report(result)
    }

    pub fn undo(&mut self) -> Result<String, WorkshopError> {
        let result = self.commands.undo(&mut self.mix).map_err(WorkshopError::from);
        self.report(result)
    }

    pub fn redo(&mut self) -> Result<String, WorkshopError> {
        let result = self.commands.redo(&mut self.mix).map_err(WorkshopError::from);
        self.report(result)
    }

    /// Id of the most recently added track
    fn last_track_id(&self) -> Result<TrackId, WorkshopError> {
        self.mix
            .tracks()
            .last()
            .map(|t| t.id)
            .ok_or_else(|| CommandError::ExecutionFailed("No track was added".into()).into())
    }

    /// Add a passage as an undoable new track
    pub fn add_passage(
        &mut self,
        passage: &Passage,
        meta: TrackMeta,
    ) -> Result<TrackId, WorkshopError> {
        let passage = match self.on_workshop_grid(passage) {
            Ok(p) => p,
            Err(e) => return self.report(Err(e.into())),
        };
        self.execute(Box::new(AddTrackCommand::new(passage, meta)))?;
        self.last_track_id()
    }

    pub fn toggle_track(&mut self, id: TrackId) -> Result<(), WorkshopError> {
        self.execute(Box::new(ToggleTrackCommand::new(id)))
    }

    pub fn remove_track(&mut self, id: TrackId) -> Result<(), WorkshopError> {
        self.execute(Box::new(RemoveTrackCommand::new(id)))
    }

    pub fn rename_track(&mut self, id: TrackId, name: &str) -> Result<(), WorkshopError> {
        self.execute(Box::new(RenameTrackCommand::new(id, name)))
    }

    pub fn set_instrument(
        &mut self,
        id: TrackId,
        program: u8,
        is_drum: bool,
    ) -> Result<(), WorkshopError> {
        self.execute(Box::new(SetInstrumentCommand::new(id, program, is_drum)))
    }

    pub fn concatenate(
        &mut self,
        first: TrackId,
        second: TrackId,
    ) -> Result<TrackId, WorkshopError> {
        self.execute(Box::new(ConcatenateTracksCommand::new(first, second)))?;
        self.last_track_id()
    }

    /// Publish an excerpt of a track without adding it to the mix
    pub fn audition_excerpt(
        &mut self,
        id: TrackId,
        start: f64,
        end: f64,
    ) -> Result<(), WorkshopError> {
        let result = (|| -> Result<_, WorkshopError> {
            let track = self
                .mix
                .track(id)
                .ok_or(MixError::TrackNotFound(id))?;
            let excerpt = trim(&track.passage, start, end)?;
            self.mix.audition(&excerpt)?;
            Ok(())
        })();
        self.report(result)
    }

    /// Ask a model for passages on the workshop grid and add each as a track.
    ///
    /// Tracks are named after `meta.name`, numbered when there are several.
    pub fn generate<S: ModelService + ?Sized>(
        &mut self,
        service: &mut S,
        seed: &Passage,
        request: &GenerationRequest,
        meta: TrackMeta,
    ) -> Result<Vec<TrackId>, WorkshopError> {
        let result = run_model(service, seed, request, Some(self.config.steps_per_quarter))
            .map_err(WorkshopError::from);
        let passages = self.report(result)?;

        let numbered = passages.len() > 1;
        let mut ids = Vec::with_capacity(passages.len());
        for (index, passage) in passages.iter().enumerate() {
            let mut meta = meta.clone();
            if numbered {
                meta.name = format!("{} {}", meta.name, index + 1);
            }
            ids.push(self.add_passage(passage, meta)?);
        }
        Ok(ids)
    }

    pub fn import_midi(&mut self, bytes: &[u8], meta: TrackMeta) -> Result<TrackId, WorkshopError> {
        let result = midi_to_passage(bytes).map_err(WorkshopError::from);
        let passage = self.report(result)?;
        self.add_passage(&passage, meta.preserving_instruments())
    }

    /// The current mix as a Standard MIDI File
    pub fn export_midi(&mut self) -> Result<Vec<u8>, WorkshopError> {
        let result = passage_to_midi(self.mix.current()).map_err(WorkshopError::from);
        self.report(result)
    }

    /// One track as `.magtrack` JSON
    pub fn export_track(&mut self, id: TrackId) -> Result<String, WorkshopError> {
        let result = (|| -> Result<_, WorkshopError> {
            let track = self.mix.track(id).ok_or(MixError::TrackNotFound(id))?;
            let file = serialize_track(track, &self.config.app_name)?;
            Ok(track_to_json(&file)?)
        })();
        self.report(result)
    }

    pub fn import_track(&mut self, json: &str) -> Result<TrackId, WorkshopError> {
        let result = track_from_json(json).map_err(WorkshopError::from);
        let loaded = self.report(result)?;
        let id = self.add_passage(&loaded.passage, loaded.meta)?;
        if !loaded.is_active {
            let result = self.mix.set_active(id, false).map_err(WorkshopError::from);
            self.report(result)?;
        }
        Ok(id)
    }

    pub fn save_session<P: AsRef<Path>>(
        &mut self,
        path: P,
        title: &str,
    ) -> Result<SessionManifest, WorkshopError> {
        let result = self
            .sessions
            .save(path, title, &self.mix)
            .map_err(WorkshopError::from);
        self.report(result)
    }

    /// Replace all tracks with a saved session's; clears undo history
    pub fn load_session<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<SessionManifest, WorkshopError> {
        let result = (|| -> Result<_, WorkshopError> {
            let session = self.sessions.load(path)?;
            self.sessions.restore_into(&session, &mut self.mix)?;
            Ok(session.manifest)
        })();
        if result.is_ok() {
            self.commands.clear();
        }
        self.report(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{ScaleParams, arithmetic_scale};
    use crate::external::ModelError;
    use crate::interchange::RawNoteSequence;
    use crate::messaging::NotificationLevel;
    use crate::sequencer::note::Note;

    struct EchoService;

    impl ModelService for EchoService {
        fn name(&self) -> &str {
            "Echo"
        }

        fn generate(
            &mut self,
            seed: &Passage,
            _request: &GenerationRequest,
        ) -> Result<Vec<RawNoteSequence>, ModelError> {
            Ok(vec![RawNoteSequence::from(seed), RawNoteSequence::from(seed)])
        }
    }

    struct BrokenService;

    impl ModelService for BrokenService {
        fn name(&self) -> &str {
            "Broken VAE"
        }

        fn generate(
            &mut self,
            _seed: &Passage,
            _request: &GenerationRequest,
        ) -> Result<Vec<RawNoteSequence>, ModelError> {
            Err(ModelError::Generation("weights missing".into()))
        }
    }

    fn workshop() -> Workshop {
        Workshop::new(WorkshopConfig::default()).unwrap()
    }

    fn seed() -> Passage {
        Passage::from_notes(vec![Note::new(60, 0.0, 0.5), Note::new(62, 0.5, 1.0)], 90.0)
    }

    #[test]
    fn test_new_workshop_has_silent_mix() {
        let ws = workshop();
        assert!(ws.current().is_empty());
        assert_eq!(ws.current().qpm(), Some(90.0));
        assert!(ws.current().total_time > 0.0);

        let bad = WorkshopConfig {
            qpm: -1.0,
            ..Default::default()
        };
        assert!(matches!(Workshop::new(bad), Err(WorkshopError::Config(_))));
    }

    #[test]
    fn test_add_passage_uses_workshop_grid() {
        let mut ws = workshop();
        let scale = arithmetic_scale(&ScaleParams {
            length: 4,
            qpm: 90.0,
            ..Default::default()
        })
        .unwrap();

        let id = ws.add_passage(&scale, TrackMeta::new("Scale")).unwrap();
        assert_eq!(ws.mix().track(id).unwrap().passage.steps_per_quarter, Some(6));
        assert_eq!(ws.current().note_count(), 4);

        ws.undo().unwrap();
        assert_eq!(ws.mix().track_count(), 0);
        ws.redo().unwrap();
        assert_eq!(ws.mix().track(id).unwrap().name, "Scale");
    }

    #[test]
    fn test_generate_adds_numbered_tracks() {
        let mut ws = workshop();
        let ids = ws
            .generate(
                &mut EchoService,
                &seed(),
                &GenerationRequest::sample(2, 1.0),
                TrackMeta::new("Sample"),
            )
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ws.mix().track(ids[0]).unwrap().name, "Sample 1");
        assert_eq!(ws.mix().track(ids[1]).unwrap().name, "Sample 2");
        assert_eq!(ws.current().note_count(), 4);
        assert!(ws.notifications().is_empty());
    }

    #[test]
    fn test_failed_generation_is_reported() {
        let mut ws = workshop();
        let err = ws
            .generate(
                &mut BrokenService,
                &seed(),
                &GenerationRequest::continuation(24, 1.0),
                TrackMeta::new("Continuation"),
            )
            .unwrap_err();

        assert!(matches!(err, WorkshopError::External(_)));
        assert_eq!(ws.mix().track_count(), 0);
        let note = ws.notifications().latest().unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(note.category, NotificationCategory::Model);
        assert!(note.message.contains("Broken VAE (continue)"));
    }

    #[test]
    fn test_track_file_and_midi_round_trip() {
        let mut ws = workshop();
        let id = ws.add_passage(&seed(), TrackMeta::new("Seed")).unwrap();

        let json = ws.export_track(id).unwrap();
        let copy = ws.import_track(&json).unwrap();
        assert_ne!(copy, id);
        assert_eq!(ws.mix().track(copy).unwrap().name, "Seed");

        let bytes = ws.export_midi().unwrap();
        let imported = ws.import_midi(&bytes, TrackMeta::new("From MIDI")).unwrap();
        assert_eq!(ws.mix().track(imported).unwrap().passage.note_count(), 4);
    }

    #[test]
    fn test_inactive_track_file_imports_inactive() {
        let mut ws = workshop();
        let id = ws.add_passage(&seed(), TrackMeta::new("Seed")).unwrap();
        ws.toggle_track(id).unwrap();

        let json = ws.export_track(id).unwrap();
        let copy = ws.import_track(&json).unwrap();
        assert!(!ws.mix().track(copy).unwrap().is_active);
        assert!(ws.current().is_empty());

        // Undo and redo of the import keep the flag
        ws.undo().unwrap();
        ws.redo().unwrap();
        assert!(!ws.mix().track(copy).unwrap().is_active);
    }

    #[test]
    fn test_bad_imports_are_reported() {
        let mut ws = workshop();

        assert!(ws.import_track("{}").is_err());
        assert!(ws.import_midi(b"garbage", TrackMeta::new("x")).is_err());
        assert!(ws.toggle_track(42).is_err());

        let categories: Vec<NotificationCategory> =
            ws.notifications().iter().map(|n| n.category).collect();
        assert_eq!(
            categories,
            vec![
                NotificationCategory::TrackFile,
                NotificationCategory::MidiFile,
                NotificationCategory::Mix,
            ]
        );
    }

    #[test]
    fn test_audition_excerpt() {
        let mut ws = workshop();
        let id = ws.add_passage(&seed(), TrackMeta::new("Seed")).unwrap();

        ws.audition_excerpt(id, 0.5, 1.0).unwrap();
        assert_eq!(ws.current().pitches(), vec![62]);
        assert!((ws.current().total_time - 0.5).abs() < 1e-9);
        assert_eq!(ws.mix().track_count(), 1);
    }

    #[test]
    fn test_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.zip");

        let mut ws = workshop();
        let a = ws.add_passage(&seed(), TrackMeta::new("A")).unwrap();
        ws.add_passage(&seed(), TrackMeta::new("B")).unwrap();
        ws.toggle_track(a).unwrap();
        ws.save_session(&path, "Test").unwrap();

        let mut other = workshop();
        let manifest = other.load_session(&path).unwrap();
        assert_eq!(manifest.title, "Test");
        assert_eq!(other.mix().track_count(), 2);
        assert_eq!(other.mix().active_count(), 1);
        assert!(!other.commands().can_undo());
    }
}
