// Concrete mix commands

use crate::command::trait_def::{CommandError, CommandResult, UndoableCommand};
use crate::mix::{Track, TrackId, TrackMeta, TrackMixManager};
use crate::sequencer::passage::Passage;

/// Add a passage as a new track
///
/// Undo removes the track; redo puts the very same track (same id) back.
pub struct AddTrackCommand {
    passage: Passage,
    meta: TrackMeta,
    id: Option<TrackId>,
    removed: Option<Track>,
}

impl AddTrackCommand {
    pub fn new(passage: Passage, meta: TrackMeta) -> Self {
        Self {
            passage,
            meta,
            id: None,
            removed: None,
        }
    }
}

impl UndoableCommand for AddTrackCommand {
    fn execute(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        match self.removed.take() {
            Some(track) => mix.insert_track(usize::MAX, track)?,
            None => self.id = Some(mix.add_track(&self.passage, self.meta.clone())?),
        }
        Ok(())
    }

    fn undo(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        let id = self
            .id
            .ok_or_else(|| CommandError::UndoFailed("Track was never added".into()))?;
        self.removed = Some(mix.remove_track(id)?);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Add track '{}'", self.meta.name)
    }
}

/// Flip a track between active and inactive
pub struct ToggleTrackCommand {
    id: TrackId,
}

impl ToggleTrackCommand {
    pub fn new(id: TrackId) -> Self {
        Self { id }
    }
}

impl UndoableCommand for ToggleTrackCommand {
    fn execute(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        mix.toggle_track(self.id)?;
        Ok(())
    }

    fn undo(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        mix.toggle_track(self.id)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Toggle track {}", self.id)
    }
}

/// Remove a track, restoring it at its old position on undo
pub struct RemoveTrackCommand {
    id: TrackId,
    removed: Option<(usize, Track)>,
}

impl RemoveTrackCommand {
    pub fn new(id: TrackId) -> Self {
        Self { id, removed: None }
    }
}

impl UndoableCommand for RemoveTrackCommand {
    fn execute(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        let index = mix
            .track_index(self.id)
            .ok_or_else(|| CommandError::ExecutionFailed(format!("Track {} not found", self.id)))?;
        let track = mix.remove_track(self.id)?;
        self.removed = Some((index, track));
        Ok(())
    }

    fn undo(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        let (index, track) = self
            .removed
            .take()
            .ok_or_else(|| CommandError::UndoFailed("No removed track stored".into()))?;
        mix.insert_track(index, track)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Remove track {}", self.id)
    }
}

pub struct RenameTrackCommand {
    id: TrackId,
    new_name: String,
    old_name: Option<String>,
}

impl RenameTrackCommand {
    pub fn new(id: TrackId, name: impl Into<String>) -> Self {
        Self {
            id,
            new_name: name.into(),
            old_name: None,
        }
    }
}

impl UndoableCommand for RenameTrackCommand {
    fn execute(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        self.old_name = Some(mix.rename_track(self.id, &self.new_name)?);
        Ok(())
    }

    fn undo(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        let old_name = self
            .old_name
            .as_deref()
            .ok_or_else(|| CommandError::UndoFailed("No previous name stored".into()))?;
        mix.rename_track(self.id, old_name)?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Rename track to '{}'", self.new_name)
    }
}

/// Change a track's default program and drum flag
pub struct SetInstrumentCommand {
    id: TrackId,
    program: u8,
    is_drum: bool,
    previous: Option<(u8, bool)>,
}

impl SetInstrumentCommand {
    pub fn new(id: TrackId, program: u8, is_drum: bool) -> Self {
        Self {
            id,
            program,
            is_drum,
            previous: None,
        }
    }
}

impl UndoableCommand for SetInstrumentCommand {
    fn execute(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        self.previous = Some(mix.set_track_instrument(self.id, self.program, self.is_drum)?);
        Ok(())
    }

    fn undo(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        let (program, is_drum) = self
            .previous
            .ok_or_else(|| CommandError::UndoFailed("No previous instrument stored".into()))?;
        mix.set_track_instrument(self.id, program, is_drum)?;
        Ok(())
    }

    fn description(&self) -> String {
        if self.is_drum {
            "Set instrument to drums".to_string()
        } else {
            format!("Set instrument to program {}", self.program)
        }
    }
}

/// Splice two tracks into a new one
pub struct ConcatenateTracksCommand {
    first: TrackId,
    second: TrackId,
    created: Option<TrackId>,
    removed: Option<Track>,
}

impl ConcatenateTracksCommand {
    pub fn new(first: TrackId, second: TrackId) -> Self {
        Self {
            first,
            second,
            created: None,
            removed: None,
        }
    }
}

impl UndoableCommand for ConcatenateTracksCommand {
    fn execute(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        match self.removed.take() {
            Some(track) => mix.insert_track(usize::MAX, track)?,
            None => self.created = Some(mix.concatenate_selected(self.first, self.second)?),
        }
        Ok(())
    }

    fn undo(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
        let id = self
            .created
            .ok_or_else(|| CommandError::UndoFailed("Nothing was concatenated".into()))?;
        self.removed = Some(mix.remove_track(id)?);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Concatenate tracks {} and {}", self.first, self.second)
    }
}
