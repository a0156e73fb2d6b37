// Command Pattern for Undo/Redo of mix edits
//
// User-driven mutations of the TrackMixManager go through UndoableCommand so
// they can be undone and redone from a bounded history.

pub mod commands;
pub mod manager;
pub mod trait_def;

pub use commands::{
    AddTrackCommand, ConcatenateTracksCommand, RemoveTrackCommand, RenameTrackCommand,
    SetInstrumentCommand, ToggleTrackCommand,
};
pub use manager::CommandManager;
pub use trait_def::{CommandError, CommandResult, UndoableCommand};
