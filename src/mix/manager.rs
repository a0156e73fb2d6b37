// TrackMixManager - Owns the tracks and the composite "current" passage
//
// Every mix-affecting mutation recomputes the mix:
// active tracks -> instrument policy -> reconcile -> merge -> publish.
// Listeners (playback, visualization) receive every published passage.

use crate::mix::track::{Track, TrackId, TrackMeta};
use crate::sequencer::compose::{ConcatOptions, concatenate, merge};
use crate::sequencer::normalize::{MIN_TOTAL_TIME, normalize};
use crate::sequencer::passage::{Passage, TempoMarker};
use crate::sequencer::reconcile::reconcile;
use crate::sequencer::timeline::{DEFAULT_QPM, Tempo, TimeGridError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MixError {
    #[error("Track {0} not found")]
    TrackNotFound(TrackId),

    #[error("Track name cannot be empty")]
    EmptyName,

    #[error(transparent)]
    Grid(#[from] TimeGridError),
}

/// Receives the composite passage every time it is republished
pub trait MixListener {
    fn on_mix(&mut self, mix: &Passage);
}

pub struct TrackMixManager {
    tracks: Vec<Track>,
    current: Passage,
    next_id: TrackId,
    /// Tempo of the silent mix published when no track is active
    idle_qpm: f64,
    listeners: Vec<Box<dyn MixListener>>,
}

/// Explicit empty passage so consumers always have something to stop against
fn silent_mix(qpm: f64) -> Passage {
    Passage {
        notes: Vec::new(),
        tempos: vec![TempoMarker::at_start(qpm)],
        steps_per_quarter: None,
        total_time: MIN_TOTAL_TIME,
        total_steps: None,
    }
}

fn validate_name(name: &str) -> Result<(), MixError> {
    if name.trim().is_empty() {
        return Err(MixError::EmptyName);
    }
    Ok(())
}

impl TrackMixManager {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            current: silent_mix(DEFAULT_QPM),
            next_id: 1,
            idle_qpm: DEFAULT_QPM,
            listeners: Vec::new(),
        }
    }

    /// Manager whose silent mix uses `qpm` (normally the workshop tempo)
    pub fn with_tempo(qpm: f64) -> Result<Self, MixError> {
        let tempo = Tempo::new(qpm)?;
        Ok(Self {
            current: silent_mix(tempo.qpm()),
            idle_qpm: tempo.qpm(),
            ..Self::new()
        })
    }

    pub fn add_listener(&mut self, listener: Box<dyn MixListener>) {
        self.listeners.push(listener);
    }

    /// Normalize `passage`, store it as a new active track and recompute the mix
    pub fn add_track(&mut self, passage: &Passage, meta: TrackMeta) -> Result<TrackId, MixError> {
        validate_name(&meta.name)?;
        let passage = normalize(passage)?;

        let id = self.next_id;
        self.next_id += 1;
        log::info!(
            "Added track {} '{}' ({} notes)",
            id,
            meta.name,
            passage.note_count()
        );
        self.tracks.push(Track::new(id, passage, meta));

        self.recompute_mix()?;
        Ok(id)
    }

    /// Put a previously removed track back at `index` (clamped to the end)
    pub fn insert_track(&mut self, index: usize, track: Track) -> Result<(), MixError> {
        validate_name(&track.name)?;
        let index = index.min(self.tracks.len());
        self.next_id = self.next_id.max(track.id + 1);
        self.tracks.insert(index, track);
        self.recompute_mix()?;
        Ok(())
    }

    /// Flip a track between active and inactive; returns the new state
    pub fn toggle_track(&mut self, id: TrackId) -> Result<bool, MixError> {
        let track = self.track_mut(id)?;
        track.is_active = !track.is_active;
        let active = track.is_active;
        self.recompute_mix()?;
        Ok(active)
    }

    pub fn set_active(&mut self, id: TrackId, active: bool) -> Result<(), MixError> {
        let track = self.track_mut(id)?;
        if track.is_active != active {
            track.is_active = active;
            self.recompute_mix()?;
        }
        Ok(())
    }

    pub fn remove_track(&mut self, id: TrackId) -> Result<Track, MixError> {
        let index = self.track_index(id).ok_or(MixError::TrackNotFound(id))?;
        let track = self.tracks.remove(index);
        log::info!("Removed track {} '{}'", id, track.name);
        self.recompute_mix()?;
        Ok(track)
    }

    /// Rename a track; returns the previous name
    pub fn rename_track(&mut self, id: TrackId, name: &str) -> Result<String, MixError> {
        validate_name(name)?;
        let track = self.track_mut(id)?;
        Ok(std::mem::replace(&mut track.name, name.to_string()))
    }

    /// Change the default instrument; returns the previous `(program, is_drum)`
    pub fn set_track_instrument(
        &mut self,
        id: TrackId,
        program: u8,
        is_drum: bool,
    ) -> Result<(u8, bool), MixError> {
        let track = self.track_mut(id)?;
        let previous = (track.program, track.is_drum);
        track.program = program;
        track.is_drum = is_drum;
        self.recompute_mix()?;
        Ok(previous)
    }

    /// Returns the previous flag
    pub fn set_preserve_instruments(
        &mut self,
        id: TrackId,
        preserve: bool,
    ) -> Result<bool, MixError> {
        let track = self.track_mut(id)?;
        let previous = std::mem::replace(&mut track.preserve_instruments, preserve);
        self.recompute_mix()?;
        Ok(previous)
    }

    /// Rebuild the composite passage from the active tracks and publish it
    pub fn recompute_mix(&mut self) -> Result<&Passage, MixError> {
        let arranged: Vec<Passage> = self
            .tracks
            .iter()
            .filter(|t| t.is_active)
            .map(Track::arranged)
            .collect();

        let mix = if arranged.is_empty() {
            silent_mix(self.idle_qpm)
        } else {
            merge(&reconcile(&arranged))?
        };
        self.publish(mix);
        Ok(&self.current)
    }

    /// Splice track `b` after track `a` into a new track named "<A> + <B>"
    pub fn concatenate_selected(&mut self, a: TrackId, b: TrackId) -> Result<TrackId, MixError> {
        let first = self.track(a).ok_or(MixError::TrackNotFound(a))?;
        let second = self.track(b).ok_or(MixError::TrackNotFound(b))?;

        let spliced = concatenate(
            &[first.arranged(), second.arranged()],
            &ConcatOptions::default(),
        )?;
        // Per-note instruments come from the sources
        let meta = TrackMeta::new(format!("{} + {}", first.name, second.name))
            .with_instrument(first.program, first.is_drum)
            .preserving_instruments();

        self.add_track(&spliced, meta)
    }

    /// Publish a transient passage (e.g. a trimmed excerpt) without creating a track.
    ///
    /// The next mix-affecting mutation replaces it.
    pub fn audition(&mut self, passage: &Passage) -> Result<(), MixError> {
        let passage = normalize(passage)?;
        self.publish(passage);
        Ok(())
    }

    /// Remove every track and publish the silent mix
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.publish(silent_mix(self.idle_qpm));
    }

    pub fn current(&self) -> &Passage {
        &self.current
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn track_index(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn active_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_active).count()
    }

    fn track_mut(&mut self, id: TrackId) -> Result<&mut Track, MixError> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(MixError::TrackNotFound(id))
    }

    fn publish(&mut self, mix: Passage) {
        self.current = mix;
        for listener in self.listeners.iter_mut() {
            listener.on_mix(&self.current);
        }
    }
}

impl Default for TrackMixManager {
    fn default() -> Self {
        Self::new()
    }
}
