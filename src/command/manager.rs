// Mix edit history - bounded undo/redo over TrackMixManager commands

use crate::command::trait_def::{CommandError, CommandResult, UndoableCommand};
use crate::mix::TrackMixManager;
use std::collections::VecDeque;

/// Edits kept for undo unless configured otherwise
pub const DEFAULT_UNDO_LIMIT: usize = 100;

type History = VecDeque<Box<dyn UndoableCommand>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

/// Undo/redo history of mix edits.
///
/// Recording a new edit forgets everything that could be redone. Only the
/// newest `limit` edits stay undoable.
pub struct CommandManager {
    done: History,
    undone: History,
    limit: usize,
}

impl CommandManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_UNDO_LIMIT)
    }

    /// History keeping at most `limit` undoable edits (at least one)
    pub fn with_capacity(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            done: VecDeque::with_capacity(limit.min(256)),
            undone: VecDeque::new(),
            limit,
        }
    }

    /// Apply `command` to the mix and record it. A failing command is not recorded.
    pub fn execute(
        &mut self,
        mut command: Box<dyn UndoableCommand>,
        mix: &mut TrackMixManager,
    ) -> CommandResult<()> {
        command.execute(mix)?;
        log::debug!("Mix edit: {}", command.description());

        self.undone.clear();
        self.done.push_back(command);
        while self.done.len() > self.limit {
            self.done.pop_front();
        }
        Ok(())
    }

    /// Revert the newest edit, returning its description
    pub fn undo(&mut self, mix: &mut TrackMixManager) -> CommandResult<String> {
        self.step(Direction::Undo, mix)
    }

    /// Re-apply the newest reverted edit, returning its description
    pub fn redo(&mut self, mix: &mut TrackMixManager) -> CommandResult<String> {
        self.step(Direction::Redo, mix)
    }

    /// Move one command across the stacks; it stays put when it fails
    fn step(&mut self, direction: Direction, mix: &mut TrackMixManager) -> CommandResult<String> {
        let (from, to) = match direction {
            Direction::Undo => (&mut self.done, &mut self.undone),
            Direction::Redo => (&mut self.undone, &mut self.done),
        };
        let Some(mut command) = from.pop_back() else {
            return Err(match direction {
                Direction::Undo => CommandError::UndoFailed("Nothing to undo".into()),
                Direction::Redo => CommandError::ExecutionFailed("Nothing to redo".into()),
            });
        };

        let outcome = match direction {
            Direction::Undo => command.undo(mix),
            Direction::Redo => command.execute(mix),
        };
        let description = command.description();
        match outcome {
            Ok(()) => {
                log::debug!("{:?}: {}", direction, description);
                to.push_back(command);
                Ok(description)
            }
            Err(e) => {
                from.push_back(command);
                Err(e)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// What `undo` would revert
    pub fn undo_description(&self) -> Option<String> {
        self.done.back().map(|cmd| cmd.description())
    }

    /// What `redo` would re-apply
    pub fn redo_description(&self) -> Option<String> {
        self.undone.back().map(|cmd| cmd.description())
    }

    /// Undoable edits, newest first
    pub fn history(&self) -> Vec<String> {
        self.done.iter().rev().map(|cmd| cmd.description()).collect()
    }

    /// Forget every edit, e.g. after loading a session
    pub fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.done.len()
    }

    pub fn redo_count(&self) -> usize {
        self.undone.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::commands::{RenameTrackCommand, ToggleTrackCommand};
    use crate::mix::{TrackId, TrackMeta};
    use crate::sequencer::note::Note;
    use crate::sequencer::passage::Passage;

    fn mix_with_track() -> (TrackMixManager, TrackId) {
        let mut mix = TrackMixManager::new();
        let passage = Passage::from_notes(vec![Note::new(60, 0.0, 1.0)], 120.0);
        let id = mix.add_track(&passage, TrackMeta::new("Lead")).unwrap();
        (mix, id)
    }

    #[test]
    fn test_execute_command() {
        let mut manager = CommandManager::new();
        let (mut mix, id) = mix_with_track();

        manager
            .execute(Box::new(ToggleTrackCommand::new(id)), &mut mix)
            .unwrap();

        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 0);
        assert!(manager.can_undo());
        assert!(!manager.can_redo());
        assert!(!mix.track(id).unwrap().is_active);
    }

    #[test]
    fn test_undo_redo() {
        let mut manager = CommandManager::new();
        let (mut mix, id) = mix_with_track();

        manager
            .execute(Box::new(RenameTrackCommand::new(id, "Bass")), &mut mix)
            .unwrap();

        let description = manager.undo(&mut mix).unwrap();
        assert_eq!(description, "Rename track to 'Bass'");
        assert_eq!(mix.track(id).unwrap().name, "Lead");
        assert_eq!(manager.redo_count(), 1);

        manager.redo(&mut mix).unwrap();
        assert_eq!(mix.track(id).unwrap().name, "Bass");
        assert_eq!(manager.undo_count(), 1);
        assert_eq!(manager.redo_count(), 0);
    }

    #[test]
    fn test_failed_command_not_recorded() {
        let mut manager = CommandManager::new();
        let (mut mix, _) = mix_with_track();

        let result = manager.execute(Box::new(ToggleTrackCommand::new(99)), &mut mix);
        assert!(result.is_err());
        assert!(!manager.can_undo());
    }

    #[test]
    fn test_redo_stack_cleared_on_new_command() {
        let mut manager = CommandManager::new();
        let (mut mix, id) = mix_with_track();

        manager
            .execute(Box::new(ToggleTrackCommand::new(id)), &mut mix)
            .unwrap();
        manager.undo(&mut mix).unwrap();
        manager
            .execute(Box::new(RenameTrackCommand::new(id, "Other")), &mut mix)
            .unwrap();

        assert!(!manager.can_redo());
        assert_eq!(manager.undo_description().as_deref(), Some("Rename track to 'Other'"));
    }

    #[test]
    fn test_history_limit() {
        let mut manager = CommandManager::with_capacity(3);
        let (mut mix, id) = mix_with_track();

        for _ in 0..5 {
            manager
                .execute(Box::new(ToggleTrackCommand::new(id)), &mut mix)
                .unwrap();
        }

        assert_eq!(manager.undo_count(), 3);
    }

    #[test]
    fn test_history_newest_first() {
        let mut manager = CommandManager::new();
        let (mut mix, id) = mix_with_track();

        manager
            .execute(Box::new(RenameTrackCommand::new(id, "Bass")), &mut mix)
            .unwrap();
        manager
            .execute(Box::new(RenameTrackCommand::new(id, "Sub")), &mut mix)
            .unwrap();

        assert_eq!(
            manager.history(),
            vec!["Rename track to 'Sub'", "Rename track to 'Bass'"]
        );
        assert_eq!(CommandManager::with_capacity(0).limit(), 1);
    }

    #[test]
    fn test_empty_stacks() {
        let mut manager = CommandManager::new();
        let (mut mix, _) = mix_with_track();

        assert!(manager.undo(&mut mix).is_err());
        assert!(manager.redo(&mut mix).is_err());
    }
}
