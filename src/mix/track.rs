// Track - A named, toggleable passage inside the mix

use crate::sequencer::passage::Passage;
use serde::{Deserialize, Serialize};

/// Unique identifier for tracks, assigned by the owning manager
pub type TrackId = u64;

/// Metadata supplied when a track is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMeta {
    pub name: String,

    /// Default General MIDI program for the track
    pub program: u8,

    pub is_drum: bool,

    /// Keep each note's own program/drum flag instead of the track default
    pub preserve_instruments: bool,
}

impl TrackMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: 0,
            is_drum: false,
            preserve_instruments: false,
        }
    }

    pub fn with_instrument(mut self, program: u8, is_drum: bool) -> Self {
        self.program = program;
        self.is_drum = is_drum;
        self
    }

    pub fn preserving_instruments(mut self) -> Self {
        self.preserve_instruments = true;
        self
    }
}

/// A track in the mix
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Normalized passage
    pub passage: Passage,
    pub program: u8,
    pub is_drum: bool,
    pub preserve_instruments: bool,
    pub is_active: bool,
}

impl Track {
    /// New active track (the passage must already be normalized)
    pub fn new(id: TrackId, passage: Passage, meta: TrackMeta) -> Self {
        Self {
            id,
            name: meta.name,
            passage,
            program: meta.program,
            is_drum: meta.is_drum,
            preserve_instruments: meta.preserve_instruments,
            is_active: true,
        }
    }

    pub fn meta(&self) -> TrackMeta {
        TrackMeta {
            name: self.name.clone(),
            program: self.program,
            is_drum: self.is_drum,
            preserve_instruments: self.preserve_instruments,
        }
    }

    /// The passage as it sounds in the mix, after the instrument policy
    pub fn arranged(&self) -> Passage {
        if self.preserve_instruments {
            self.passage.clone()
        } else {
            self.passage.with_instrument(self.program, self.is_drum)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::note::Note;

    fn mixed_instruments() -> Passage {
        Passage::from_notes(
            vec![
                Note::new(36, 0.0, 0.5).with_drum(true),
                Note::new(60, 0.0, 0.5).with_program(40),
            ],
            120.0,
        )
    }

    #[test]
    fn test_track_from_meta() {
        let meta = TrackMeta::new("Bass").with_instrument(33, false);
        let track = Track::new(7, Passage::new(), meta.clone());

        assert_eq!(track.id, 7);
        assert!(track.is_active);
        assert_eq!(track.meta(), meta);
    }

    #[test]
    fn test_arranged_overwrites_instruments() {
        let track = Track::new(
            1,
            mixed_instruments(),
            TrackMeta::new("Lead").with_instrument(81, false),
        );
        let arranged = track.arranged();

        assert!(arranged.notes.iter().all(|n| n.program == 81 && !n.is_drum));
        // The stored passage keeps its own instruments
        assert!(track.passage.notes[0].is_drum);
    }

    #[test]
    fn test_arranged_preserves_instruments() {
        let track = Track::new(
            1,
            mixed_instruments(),
            TrackMeta::new("Splice").preserving_instruments(),
        );
        assert_eq!(track.arranged(), mixed_instruments());
    }
}
