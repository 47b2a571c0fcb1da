//! Editable targets and reversible commands.
//!
//! - [`Editable`]: marker trait for types that commands operate on
//! - [`Command`]: a reversible edit operation
//! - [`CommandError`] / [`CommandResult`]: error handling for commands
//!
//! Commands are self-contained: each implementation stores whatever it needs
//! to apply and reverse its change (target handles, old/new values, detached
//! subtrees, etc.).

use std::any::Any;
use std::fmt;

/// Helper trait for downcasting trait objects to concrete types.
///
/// Automatically implemented for all `'static` types.
pub trait AsAny: 'static {
    /// Returns a reference to `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Marker trait for types that serve as command targets.
///
/// `AssetRef` names the pool-managed objects a command can keep alive while
/// it sits in a history. A target with no pools uses `()`.
pub trait Editable: 'static {
    /// Handle to a pool-managed asset that commands may reference.
    type AssetRef: Clone + fmt::Debug;
}

/// Error type for command and history failures.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// `undo()` was called with nothing on the undo side.
    #[error("nothing to undo")]
    NothingToUndo,
    /// `redo()` was called with nothing on the redo side.
    #[error("nothing to redo")]
    NothingToRedo,
    /// The command refused to execute in the current target state.
    #[error("command cannot be executed: {0}")]
    CannotExecute(String),
    /// The command refused to un-execute in the current target state.
    #[error("command cannot be un-executed: {0}")]
    CannotUnExecute(String),
    /// Undo/redo is not available while a transaction is open.
    #[error("a transaction is active")]
    TransactionActive,
    /// `end_transaction` or `cancel_transaction` without an open transaction.
    #[error("no active transaction")]
    NoActiveTransaction,
    /// The target is in an invalid state for this command.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// An error raised by the target itself while applying a change.
    #[error(transparent)]
    Target(Box<dyn std::error::Error + Send + Sync>),
}

impl CommandError {
    /// Wraps a target-specific error.
    pub fn target(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Target(Box::new(err))
    }
}

/// Result type for command operations.
pub type CommandResult<T = ()> = Result<T, CommandError>;

/// A reversible edit (Command pattern).
///
/// # Asset reporting
///
/// [`used_assets`](Self::used_assets) must list every pool-managed asset the
/// command could need again on undo or redo. Asset cleanup treats the
/// history as a reachability root and trusts this list: an asset the command
/// forgets to report can be destroyed while the command still needs it.
///
/// # Object Safety
///
/// This trait is dyn-compatible so that different command types can be
/// stored in one [`UndoRedoManager`](super::UndoRedoManager) as
/// `Box<dyn Command<T>>`.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug)]
/// struct Rename {
///     node: NodeId,
///     old: String,
///     new: String,
/// }
///
/// impl Command<Document> for Rename {
///     fn execute(&mut self, target: &mut Document) -> CommandResult {
///         target.set_name(self.node, &self.new).map_err(CommandError::target)
///     }
///
///     fn un_execute(&mut self, target: &mut Document) -> CommandResult {
///         target.set_name(self.node, &self.old).map_err(CommandError::target)
///     }
///
///     fn description(&self) -> &str {
///         "Rename node"
///     }
///
///     fn used_assets(&self, _target: &Document) -> Vec<AssetRef> {
///         Vec::new()
///     }
/// }
/// ```
pub trait Command<T: Editable>: fmt::Debug + AsAny + Send {
    /// Applies the command (forward / redo direction).
    fn execute(&mut self, target: &mut T) -> CommandResult;

    /// Reverses the command. Must restore the state seen before
    /// [`execute`](Self::execute).
    fn un_execute(&mut self, target: &mut T) -> CommandResult;

    /// Whether the command can currently be applied. Default: `true`.
    fn can_execute(&self, _target: &T) -> bool {
        true
    }

    /// Whether the command can currently be reversed. Default: `true`.
    fn can_un_execute(&self, _target: &T) -> bool {
        true
    }

    /// A short, human-readable description for an edit menu.
    fn description(&self) -> &str;

    /// Assets this command references, on either side of the history cursor.
    fn used_assets(&self, target: &T) -> Vec<T::AssetRef>;
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn execute_modifies_target() {
        let mut counter = Counter { value: 0 };
        let mut command = Add { amount: 5 };
        command.execute(&mut counter).unwrap();
        assert_eq!(counter.value, 5);
    }

    #[test]
    fn un_execute_reverses_execute() {
        let mut counter = Counter { value: 0 };
        let mut command = Add { amount: 5 };
        command.execute(&mut counter).unwrap();
        command.un_execute(&mut counter).unwrap();
        assert_eq!(counter.value, 0);
    }

    #[test]
    fn default_predicates_allow() {
        let counter = Counter::default();
        let command = Add { amount: 1 };
        assert!(command.can_execute(&counter));
        assert!(command.can_un_execute(&counter));
    }

    #[test]
    fn command_error_display() {
        assert_eq!(CommandError::NothingToUndo.to_string(), "nothing to undo");
        assert_eq!(
            CommandError::CannotExecute("Add".into()).to_string(),
            "command cannot be executed: Add"
        );
        assert_eq!(
            CommandError::InvalidState("locked".into()).to_string(),
            "invalid state: locked"
        );
    }

    #[test]
    fn target_error_is_transparent() {
        let io = std::io::Error::other("disk full");
        let err = CommandError::target(io);
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn command_is_dyn_compatible() {
        let mut counter = Counter { value: 0 };
        let mut boxed: Box<dyn Command<Counter>> = Box::new(Add { amount: 3 });
        boxed.execute(&mut counter).unwrap();
        assert_eq!(counter.value, 3);
        boxed.un_execute(&mut counter).unwrap();
        assert_eq!(counter.value, 0);
        assert!(boxed.as_any().downcast_ref::<Add>().is_some());
    }

    #[test]
    fn used_assets_reported() {
        let counter = Counter::default();
        let pin = Pin { asset: 9 };
        assert_eq!(pin.used_assets(&counter), vec![9]);
    }
}
