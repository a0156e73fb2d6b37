// UndoableCommand trait definition

use crate::mix::{MixError, TrackMixManager};

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors that can occur during command execution
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Undo failed: {0}")]
    UndoFailed(String),

    #[error(transparent)]
    Mix(#[from] MixError),
}

/// Trait for user-driven mix mutations that support undo/redo
///
/// Commands store whatever they need to restore the previous state while
/// executing.
///
/// # Example
/// ```no_run
/// use notegrid::command::trait_def::{CommandError, CommandResult, UndoableCommand};
/// use notegrid::mix::{TrackId, TrackMixManager};
///
/// struct MuteCommand {
///     id: TrackId,
///     was_active: Option<bool>,
/// }
///
/// impl UndoableCommand for MuteCommand {
///     fn execute(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
///         let track = mix
///             .track(self.id)
///             .ok_or_else(|| CommandError::ExecutionFailed("gone".into()))?;
///         self.was_active = Some(track.is_active);
///         mix.set_active(self.id, false)?;
///         Ok(())
///     }
///
///     fn undo(&mut self, mix: &mut TrackMixManager) -> CommandResult<()> {
///         let was_active = self
///             .was_active
///             .ok_or_else(|| CommandError::UndoFailed("Not executed".into()))?;
///         mix.set_active(self.id, was_active)?;
///         Ok(())
///     }
///
///     fn description(&self) -> String {
///         format!("Mute track {}", self.id)
///     }
/// }
/// ```
pub trait UndoableCommand: Send {
    /// Execute the command, remembering what undo needs
    fn execute(&mut self, mix: &mut TrackMixManager) -> CommandResult<()>;

    /// Restore the state from before `execute`
    fn undo(&mut self, mix: &mut TrackMixManager) -> CommandResult<()>;

    /// Human-readable description (e.g., "Undo: Toggle track 3")
    fn description(&self) -> String;
}
